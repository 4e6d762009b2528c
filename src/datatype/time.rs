//! Point-in-time values.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Gregorian calendar model item on Wikidata.
pub const GREGORIAN_CALENDAR: &str = "http://www.wikidata.org/entity/Q1985727";

static RE_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-][0-9]{1,16}-(?:1[0-2]|0[0-9])-(?:3[01]|0[0-9]|[12][0-9])T(?:2[0-3]|[01][0-9]):[0-5][0-9]:[0-5][0-9]Z$")
        .unwrap()
});

/// Wikibase time precision, from billion years (0) to seconds (14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Precision {
    BillionYears = 0,
    HundredMillionYears = 1,
    TenMillionYears = 2,
    MillionYears = 3,
    HundredThousandYears = 4,
    TenThousandYears = 5,
    Millennium = 6,
    Century = 7,
    Decade = 8,
    Year = 9,
    Month = 10,
    Day = 11,
    Hour = 12,
    Minute = 13,
    Second = 14,
}

impl TryFrom<u8> for Precision {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Precision::*;
        const ALL: [Precision; 15] = [
            BillionYears,
            HundredMillionYears,
            TenMillionYears,
            MillionYears,
            HundredThousandYears,
            TenThousandYears,
            Millennium,
            Century,
            Decade,
            Year,
            Month,
            Day,
            Hour,
            Minute,
            Second,
        ];
        ALL.get(value as usize)
            .copied()
            .ok_or_else(|| ConfigError::InvalidValue {
                datatype: "time precision",
                value: value.to_string(),
                expected: "Precision must be an integer between 0 and 14.",
            })
    }
}

impl From<Precision> for u8 {
    fn from(value: Precision) -> Self {
        value as u8
    }
}

/// A Wikibase time value.
///
/// Only the timestamp takes part in the value identity; the remaining fields
/// are carried so that locally built values compare equal to decoded ones
/// when they use the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Time {
    /// Signed ISO-8601-like timestamp, e.g. `+2001-01-15T00:00:00Z`.
    pub time: String,
    #[serde(default = "default_precision")]
    pub precision: Precision,
    #[serde(default)]
    pub before: u64,
    #[serde(default)]
    pub after: u64,
    #[serde(default)]
    pub timezone: i32,
    #[serde(default = "default_calendar")]
    pub calendar_model: String,
}

fn default_precision() -> Precision {
    Precision::Day
}

fn default_calendar() -> String {
    GREGORIAN_CALENDAR.into()
}

impl Time {
    /// Day-precision Gregorian time. A missing sign is read as `+`.
    pub fn new(time: &str) -> Result<Self, ConfigError> {
        Self::with_precision(time, Precision::Day)
    }

    pub fn with_precision(time: &str, precision: Precision) -> Result<Self, ConfigError> {
        let time = normalize_timestamp(time)?;
        Ok(Self {
            time,
            precision,
            before: 0,
            after: 0,
            timezone: 0,
            calendar_model: GREGORIAN_CALENDAR.into(),
        })
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if RE_TIMESTAMP.is_match(&self.time) {
            Ok(())
        } else {
            Err(invalid_timestamp(&self.time))
        }
    }
}

/// Add the `+` sign where missing and check the shape.
pub fn normalize_timestamp(time: &str) -> Result<String, ConfigError> {
    let trimmed = time.trim();
    let signed = if trimmed.starts_with('+') || trimmed.starts_with('-') {
        trimmed.to_string()
    } else {
        format!("+{trimmed}")
    };
    if RE_TIMESTAMP.is_match(&signed) {
        Ok(signed)
    } else {
        Err(invalid_timestamp(time))
    }
}

fn invalid_timestamp(time: &str) -> ConfigError {
    ConfigError::InvalidValue {
        datatype: "time",
        value: time.to_string(),
        expected: "Timestamps look like \"+2001-01-15T00:00:00Z\".",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_is_added_when_missing() {
        assert_eq!(
            normalize_timestamp("2001-01-15T00:00:00Z").unwrap(),
            "+2001-01-15T00:00:00Z"
        );
        assert_eq!(
            normalize_timestamp("-0500-00-00T00:00:00Z").unwrap(),
            "-0500-00-00T00:00:00Z"
        );
    }

    #[test]
    fn malformed_timestamps_are_rejected() {
        assert!(normalize_timestamp("2001-13-01T00:00:00Z").is_err());
        assert!(normalize_timestamp("yesterday").is_err());
        assert!(normalize_timestamp("+2001-01-01").is_err());
    }

    #[test]
    fn precision_roundtrips_through_u8() {
        assert_eq!(Precision::try_from(11).unwrap(), Precision::Day);
        assert_eq!(u8::from(Precision::Year), 9);
        assert!(Precision::try_from(15).is_err());
    }
}
