//! Tagged sensor values.
//!
//! A [`Reading`] is either a measured value or an explicit "unavailable"
//! marker. The marker only becomes the string `"N/A"` at the serialization
//! boundary; inside the crate it is a distinct variant so a real `0.0` can
//! never be confused with a missing sensor.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SensorUnavailable;

/// Wire representation of [`Reading::Unavailable`].
pub const UNAVAILABLE_MARKER: &str = "N/A";

/// One metric value, or the fact that it could not be read.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Reading<T> {
    Present(T),
    #[default]
    Unavailable,
}

impl<T> Reading<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Self::Present(v) => Reading::Present(f(v)),
            Self::Unavailable => Reading::Unavailable,
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unavailable, Self::Present)
    }
}

impl<T> From<Result<T, SensorUnavailable>> for Reading<T> {
    fn from(result: Result<T, SensorUnavailable>) -> Self {
        match result {
            Ok(v) => Self::Present(v),
            Err(err) => {
                log::debug!("{err}");
                Self::Unavailable
            }
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Reading<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Present(v) => v.fmt(f),
            Self::Unavailable => f.write_str(UNAVAILABLE_MARKER),
        }
    }
}

impl<T: Serialize> Serialize for Reading<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Present(v) => v.serialize(serializer),
            Self::Unavailable => serializer.serialize_str(UNAVAILABLE_MARKER),
        }
    }
}

/// Accepts only the literal marker string.
struct Marker;

impl<'de> Deserialize<'de> for Marker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == UNAVAILABLE_MARKER {
            Ok(Marker)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected a value or \"{UNAVAILABLE_MARKER}\", got {raw:?}"
            )))
        }
    }
}

// Marker is tried first so that string readings spelled "N/A" still decode
// as unavailable.
#[derive(Deserialize)]
#[serde(untagged)]
enum Wire<T> {
    Missing(Marker),
    Null(()),
    Value(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Reading<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Wire::deserialize(deserializer)? {
            Wire::Missing(_) | Wire::Null(()) => Self::Unavailable,
            Wire::Value(v) => Self::Present(v),
        })
    }
}
