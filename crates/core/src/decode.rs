//! Tolerant plugin configuration decoder
//!
//! Plugin configs are plain serde structs decoded from the generic
//! table the pipeline declaration carries. Durations ride
//! `humantime_serde` (`"10s"`, `"1m"`); timestamps use the [`timestamp`]
//! helper, which accepts RFC3339 strings and Unix-millisecond numbers.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Deserialize)]
//! #[serde(default)]
//! struct ScheduleConfig {
//!     #[serde(with = "humantime_serde")]
//!     interval: Duration,
//!     count: u64,
//! }
//!
//! let config: ScheduleConfig = decode(conf)?;
//! ```

use serde::de::DeserializeOwned;

use crate::error::DecodeError;

/// Decode a plugin configuration table into its config struct
///
/// Unknown keys are ignored unless the target struct denies them.
pub fn decode<T: DeserializeOwned>(conf: &toml::Table) -> Result<T, DecodeError> {
    toml::Value::Table(conf.clone())
        .try_into()
        .map_err(DecodeError::from)
}

/// Serde helper for timestamp fields
///
/// Accepts RFC3339 strings (`"2024-05-01T10:00:00Z"`) and Unix
/// milliseconds (`1714557600000`); serializes back to RFC3339.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        struct TimestampVisitor;

        impl de::Visitor<'_> for TimestampVisitor {
            type Value = DateTime<Utc>;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("an RFC3339 timestamp or Unix milliseconds")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                DateTime::parse_from_rfc3339(v)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                DateTime::<Utc>::from_timestamp_millis(v)
                    .ok_or_else(|| E::custom(format!("{v} is out of timestamp range")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                let millis =
                    i64::try_from(v).map_err(|_| E::custom(format!("{v} is out of timestamp range")))?;
                self.visit_i64(millis)
            }
        }

        deserializer.deserialize_any(TimestampVisitor)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{DateTime, TimeZone, Utc};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        #[serde(with = "humantime_serde")]
        interval: Duration,
        #[serde(with = "timestamp")]
        since: DateTime<Utc>,
        name: String,
        retries: u32,
    }

    fn table(raw: &str) -> toml::Table {
        toml::from_str(raw).expect("valid toml")
    }

    #[test]
    fn test_decode_duration_string() {
        let sample: Sample = decode(&table(
            r#"
            interval = "10s"
            since = "2024-05-01T10:00:00Z"
            name = "tick"
            retries = 3
            "#,
        ))
        .unwrap();
        assert_eq!(sample.interval, Duration::from_secs(10));
        assert_eq!(sample.name, "tick");
        assert_eq!(sample.retries, 3);
    }

    #[test]
    fn test_decode_timestamp_rfc3339() {
        let sample: Sample = decode(&table(
            r#"
            interval = "1m"
            since = "2024-05-01T10:00:00+02:00"
            name = "tick"
            retries = 0
            "#,
        ))
        .unwrap();
        assert_eq!(
            sample.since,
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_timestamp_unix_millis() {
        let sample: Sample = decode(&table(
            r#"
            interval = "1m"
            since = 1714557600000
            name = "tick"
            retries = 0
            "#,
        ))
        .unwrap();
        assert_eq!(sample.since.timestamp_millis(), 1714557600000);
    }

    #[test]
    fn test_decode_rejects_wrong_types() {
        let result: Result<Sample, _> = decode(&table(
            r#"
            interval = "not a duration"
            since = "2024-05-01T10:00:00Z"
            name = "tick"
            retries = 0
            "#,
        ));
        assert!(result.is_err());
    }
}
