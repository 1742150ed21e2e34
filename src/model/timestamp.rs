use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Sub;

pub fn now() -> Timestamp {
    Utc::now().into()
}

/// A UTC instant.
///
/// Serialized as a fixed-width RFC 3339 string with microsecond precision, so
/// comparing two serialized timestamps as strings gives the same answer as
/// comparing the instants. The store relies on this for `ORDER BY` and range
/// filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn to_rfc3339(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        // truncated up front so that a value read back from the store equals the one written
        let micros = value.timestamp_micros();
        Self(DateTime::from_timestamp_micros(micros).unwrap_or(value))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_rfc3339().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| Self::from(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self(self.0 - rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn serializes_with_fixed_width() {
        let whole_second = Timestamp::from(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        let json = serde_json::to_string(&whole_second).unwrap();
        assert_eq!(json, "\"2024-03-01T12:00:00.000000Z\"");
    }

    #[test]
    fn string_order_matches_time_order() {
        let earlier = Timestamp::from(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        let later = Timestamp::from(earlier.inner() + Duration::microseconds(1));

        assert!(earlier < later);
        assert!(earlier.to_rfc3339() < later.to_rfc3339());
    }

    #[test]
    fn round_trips_through_json() {
        let timestamp = now();
        let json = serde_json::to_string(&timestamp).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, timestamp, "microsecond truncation happens before storage");
    }
}
