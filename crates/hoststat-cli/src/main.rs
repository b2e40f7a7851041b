//! CLI for hoststat, host telemetry with a bounded history.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::SourceArgs;
use hoststat_core::TimestampFormat;

#[derive(Parser)]
#[command(name = "hoststat")]
#[command(about = "hoststat: host telemetry sampler with a bounded history")]
#[command(version = hoststat_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard and the /stats JSON endpoint
    Serve {
        /// Address to bind
        #[arg(long, env = "HOSTSTAT_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to bind
        #[arg(long, env = "HOSTSTAT_PORT", default_value = "5000")]
        port: u16,

        /// Samples retained (default: 100 in memory, 1000 with --db)
        #[arg(long, env = "HOSTSTAT_CAPACITY")]
        capacity: Option<usize>,

        /// Persist history to this SQLite file
        #[arg(long, env = "HOSTSTAT_DB")]
        db: Option<PathBuf>,

        /// Keep history in memory only, even if a database is configured
        #[arg(long)]
        memory: bool,

        /// Timestamp rendering in responses: time or datetime
        #[arg(long, default_value = "time")]
        timestamp_format: TimestampFormat,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Collect one sample and print it as JSON
    Sample {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the history stored in a SQLite file without collecting
    History {
        /// SQLite file written by `hoststat serve --db`
        #[arg(long, env = "HOSTSTAT_DB")]
        db: PathBuf,

        /// Only show the newest N samples
        #[arg(long)]
        last: Option<usize>,

        /// Timestamp rendering: time or datetime
        #[arg(long, default_value = "datetime")]
        timestamp_format: TimestampFormat,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            capacity,
            db,
            memory,
            timestamp_format,
            source,
        } => commands::serve::run(commands::serve::ServeCommandConfig {
            host: &host,
            port,
            capacity,
            db,
            memory,
            timestamp_format,
            source: &source,
        }),
        Commands::Sample { source } => commands::sample::run(&source),
        Commands::History {
            db,
            last,
            timestamp_format,
        } => commands::history::run(&db, last, timestamp_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["hoststat", "serve"]).unwrap();
        match cli.command {
            Commands::Serve {
                timestamp_format,
                source,
                memory,
                ..
            } => {
                assert!(!memory);
                assert_eq!(timestamp_format, TimestampFormat::Time);
                assert_eq!(source.cpu_window_ms, 1000);
                assert!(!source.no_gpu);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn memory_flag_accepted_alongside_db() {
        let cli = Cli::try_parse_from(["hoststat", "serve", "--db", "x.db", "--memory"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve { memory: true, db: Some(_), .. }
        ));
    }

    #[test]
    fn bad_timestamp_format_is_rejected() {
        assert!(
            Cli::try_parse_from(["hoststat", "serve", "--timestamp-format", "epoch"]).is_err()
        );
    }

    #[test]
    fn history_requires_db() {
        if std::env::var_os("HOSTSTAT_DB").is_none() {
            assert!(Cli::try_parse_from(["hoststat", "history"]).is_err());
        }
        let cli = Cli::try_parse_from(["hoststat", "history", "--db", "s.db", "--last", "5"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::History { last: Some(5), .. }
        ));
    }
}
