//! Human-readable durations ("250ms", "5s", "2m").
//!
//! Used by configuration files and CLI flags, and by the serde helpers that
//! write durations into configs and reports.

use std::time::Duration;
use thiserror::Error;

/// Error returned for malformed duration strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid duration '{input}': {message}")]
pub struct DurationError {
    /// The rejected input
    pub input: String,
    /// What was wrong with it
    pub message: String,
}

impl DurationError {
    fn new(input: &str, message: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            message: message.into(),
        }
    }
}

/// Parses a duration such as `"250ms"`, `"5s"`, `"2m"` or `"1h"`.
///
/// A bare number is read as seconds.
///
/// # Example
///
/// ```rust
/// use driveby_core::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
/// ```
pub fn parse_duration(input: &str) -> std::result::Result<Duration, DurationError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(DurationError::new(input, "duration string is empty"));
    }

    let (num_str, unit) = trimmed.split_at(
        trimmed
            .chars()
            .position(|c| !c.is_ascii_digit())
            .unwrap_or(trimmed.len()),
    );

    let num: u64 = num_str
        .parse()
        .map_err(|_| DurationError::new(input, format!("invalid number '{}'", num_str)))?;

    let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
        "ms" | "millis" | "milliseconds" => return Ok(Duration::from_millis(num)),
        "" | "s" | "sec" | "second" | "seconds" => 1,
        "m" | "min" | "minute" | "minutes" => 60,
        "h" | "hr" | "hour" | "hours" => 3600,
        other => {
            return Err(DurationError::new(
                input,
                format!("unknown duration unit '{}'", other),
            ));
        }
    };

    num.checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| DurationError::new(input, "duration is too large"))
}

/// Formats a duration with the largest unit that represents it exactly.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis == 0 {
        return "0s".to_string();
    }
    if millis % 1000 != 0 {
        return format!("{}ms", millis);
    }
    let secs = duration.as_secs();
    if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Serde helpers for durations written as human strings.
///
/// Deserialization also accepts a bare integer, read as seconds.
pub mod human {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(u64),
    }

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => parse_duration(&text).map_err(de::Error::custom),
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        }
    }
}

/// Serde helpers writing durations as fractional milliseconds.
pub mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(ms.max(0.0) / 1000.0))
    }
}
