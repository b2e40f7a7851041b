use hoststat_core::Collected;

use super::{SourceArgs, exit_with};

/// Sample fields plus the live uptime, as one JSON object.
pub fn to_json(collected: &Collected) -> serde_json::Result<serde_json::Value> {
    let mut value = serde_json::to_value(&collected.sample)?;
    if let serde_json::Value::Object(map) = &mut value {
        map.insert("uptime".into(), serde_json::to_value(&collected.uptime)?);
    }
    Ok(value)
}

pub fn run(source: &SourceArgs) {
    let mut collector = source.collector();
    let collected = collector.collect();
    let json = to_json(&collected)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|e| exit_with(e));
    println!("{json}");
}
