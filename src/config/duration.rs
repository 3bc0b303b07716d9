//! Human-readable durations: `10ms`, `2.5s`, `250us`, `0.5`

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Non-negative span of time stored as seconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Seconds(pub f32);

impl Seconds {
    pub fn get(self) -> f32 {
        self.0
    }

    /// Saturates instead of panicking on values no parser would produce
    pub fn as_duration(self) -> Duration {
        Duration::try_from_secs_f32(self.0.max(0.0)).unwrap_or(Duration::MAX)
    }
}

fn checked(value: f32, text: impl fmt::Display) -> Result<f32, String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("Time must be a non-negative number: {}", text));
    }
    Duration::try_from_secs_f32(value)
        .map(|_| value)
        .map_err(|_| format!("Time out of range: {}", text))
}

/// Parses `<float>[n|u|m]s` or a bare float in seconds
pub fn parse_seconds(text: &str) -> Result<f32, String> {
    let trimmed = text.trim();
    let number = trimmed.strip_suffix('s').unwrap_or(trimmed);
    if number.is_empty() {
        return Err(format!("Unrecognized time: \"{}\"", text));
    }

    let (number, divisor) = match number.as_bytes()[number.len() - 1] {
        b'n' => (&number[..number.len() - 1], 1e9),
        b'u' => (&number[..number.len() - 1], 1e6),
        b'm' => (&number[..number.len() - 1], 1e3),
        _ => (number, 1.0),
    };

    let value: f32 = number
        .trim()
        .parse()
        .map_err(|_| format!("Unrecognized time: \"{}\"", text))?;
    checked(value / divisor, format!("\"{}\"", text))
}

impl FromStr for Seconds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_seconds(s).map(Seconds)
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

struct SecondsVisitor;

impl Visitor<'_> for SecondsVisitor {
    type Value = Seconds;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a duration such as \"10ms\" or a number of seconds")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Seconds, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Seconds, E> {
        checked(v as f32, v).map(Seconds).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Seconds, E> {
        self.visit_f64(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Seconds, E> {
        self.visit_f64(v as f64)
    }
}

impl<'de> Deserialize<'de> for Seconds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SecondsVisitor)
    }
}
