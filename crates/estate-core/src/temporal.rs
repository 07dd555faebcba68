//! # Temporal Types: UTC-Only Timestamps
//!
//! [`Timestamp`] is UTC, truncated to seconds. Time-lock release conditions
//! are Unix-second thresholds, so the clock value handed to the condition
//! evaluator is [`Timestamp::unix_secs`].
//!
//! Non-UTC inputs are rejected by [`Timestamp::parse`], which is also the
//! serde path. Canonical string form is `YYYY-MM-DDTHH:MM:SSZ`.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string with a `Z` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] for malformed input or
    /// any explicit offset, including `+00:00`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::InvalidTimestamp {
                value: s.to_string(),
                reason: "must use Z suffix (UTC only)".to_string(),
            });
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Create a timestamp from Unix seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the value is outside
    /// chrono's representable range.
    pub fn from_unix_secs(secs: u64) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTimestamp {
            value: secs.to_string(),
            reason: "out of range for a UTC datetime".to_string(),
        };
        let signed = i64::try_from(secs).map_err(|_| invalid())?;
        let dt = DateTime::from_timestamp(signed, 0).ok_or_else(invalid)?;
        Ok(Self(dt))
    }

    /// Unix seconds. Instants before the epoch clamp to `0`.
    pub fn unix_secs(&self) -> u64 {
        u64::try_from(self.0.timestamp()).unwrap_or(0)
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as ISO 8601 with Z suffix.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl TryFrom<String> for Timestamp {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.to_iso8601()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 45).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(123_456_789).unwrap());
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:30:45Z");
    }

    #[test]
    fn parse_accepts_z_and_rejects_offsets() {
        assert!(Timestamp::parse("2026-01-15T12:00:00Z").is_ok());
        assert!(Timestamp::parse("2026-01-15T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("2026-01-15T17:00:00+05:00").is_err());
        assert!(Timestamp::parse("not-a-date").is_err());
    }

    #[test]
    fn unix_secs_roundtrip() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let back = Timestamp::from_unix_secs(ts.unix_secs()).unwrap();
        assert_eq!(ts, back);
        assert_eq!(Timestamp::from_unix_secs(0).unwrap().unix_secs(), 0);
    }

    #[test]
    fn from_unix_secs_rejects_unrepresentable() {
        assert!(Timestamp::from_unix_secs(u64::MAX).is_err());
    }

    #[test]
    fn deserialize_goes_through_parse() {
        let ts: Timestamp = serde_json::from_str("\"2026-01-01T00:00:00.5Z\"").unwrap();
        assert_eq!(ts, Timestamp::parse("2026-01-01T00:00:00Z").unwrap());
        assert_eq!(ts.as_datetime().nanosecond(), 0);

        assert!(serde_json::from_str::<Timestamp>("\"2026-01-01T00:00:00+05:00\"").is_err());
        assert!(serde_json::from_str::<Timestamp>("\"2026-01-01T00:00:00+00:00\"").is_err());
    }

    #[test]
    fn serializes_as_canonical_string() {
        let ts = Timestamp::parse("2026-01-15T12:30:45Z").unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2026-01-15T12:30:45Z\"");
    }

    #[test]
    fn ordering_follows_time() {
        let earlier = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let later = Timestamp::parse("2026-01-15T12:00:01Z").unwrap();
        assert!(earlier < later);
        assert!(earlier.unix_secs() < later.unix_secs());
    }

    proptest! {
        #[test]
        fn unix_secs_and_string_form_agree(secs in 0u64..=253_402_300_799) {
            let ts = Timestamp::from_unix_secs(secs).unwrap();
            prop_assert_eq!(ts.unix_secs(), secs);
            prop_assert_eq!(Timestamp::parse(&ts.to_iso8601()).unwrap(), ts);
            let json = serde_json::to_string(&ts).unwrap();
            prop_assert_eq!(serde_json::from_str::<Timestamp>(&json).unwrap(), ts);
        }
    }
}
