//! Human-readable duration and boolean parsing utilities

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid duration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseFloatError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
}

/// Duration wrapper with human-readable parsing ("500ms", "5.5s", "2m")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_human_readable(&self) -> String {
        let ms = self.0.as_millis();

        if ms == 0 {
            return "0s".to_string();
        }
        if ms % 60_000 == 0 {
            return format!("{}m", ms / 60_000);
        }
        if ms % 1000 == 0 {
            return format!("{}s", ms / 1000);
        }
        if ms >= 1000 && ms % 100 == 0 {
            return format!("{}.{}s", ms / 1000, (ms % 1000) / 100);
        }

        format!("{}ms", ms)
    }
}

impl From<Duration> for HumanDuration {
    fn from(value: Duration) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct HumanDurationVisitor;

        impl<'de> serde::de::Visitor<'de> for HumanDurationVisitor {
            type Value = HumanDuration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration as string (e.g., \"500ms\", \"5.5s\") or seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(HumanDuration(Duration::from_secs(v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(|secs| HumanDuration(Duration::from_secs(secs)))
                    .map_err(|_| E::custom(format!("negative duration: {}", v)))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Duration::try_from_secs_f64(v)
                    .map(HumanDuration)
                    .map_err(E::custom)
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<HumanDuration>().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_any(HumanDurationVisitor)
    }
}

impl Serialize for HumanDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_human_readable())
    }
}

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        if s.is_empty() {
            return Err(ParseError::InvalidFormat(s));
        }

        let (num_str, unit) = match s.find(|c: char| !(c.is_ascii_digit() || c == '.')) {
            Some(0) => return Err(ParseError::InvalidFormat(s.to_string())),
            Some(pos) => (&s[..pos], s[pos..].trim()),
            None => (s.as_str(), "s"),
        };

        let num: f64 = num_str.parse()?;

        let secs = match unit {
            "ms" => num / 1000.0,
            "s" | "sec" | "secs" => num,
            "m" | "min" | "mins" => num * 60.0,
            "h" => num * 3600.0,
            _ => return Err(ParseError::InvalidUnit(unit.to_string())),
        };

        Duration::try_from_secs_f64(secs)
            .map(HumanDuration)
            .map_err(|_| ParseError::InvalidFormat(s.to_string()))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human_readable())
    }
}

/// Lenient yes/no parsing used for query flags such as `verify=no`.
///
/// Matches on the first two characters so `yes`, `y`, `on`, `true`, `enable`,
/// `allow` and `1` are all truthy while `no`, `off`, `false`, `never`,
/// `disable`, `deny` and `0` are falsy. Anything else yields `default`.
pub fn parse_bool(value: &str, default: bool) -> bool {
    let lowered = value.trim().to_lowercase();
    let prefix: String = lowered.chars().take(2).collect();

    match prefix.as_str() {
        "de" | "di" | "ne" | "no" | "of" | "fa" | "0" => false,
        "en" | "al" | "ye" | "on" | "tr" | "1" => true,
        _ => match lowered.chars().next() {
            Some('f') | Some('n') | Some('0') => false,
            Some('t') | Some('y') | Some('1') => true,
            _ => default,
        },
    }
}
