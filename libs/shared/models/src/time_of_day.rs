//! Serde helpers for wall-clock times stored without a timezone.
//!
//! Times are written as `HH:MM` and read from either `HH:MM` or `HH:MM:SS`,
//! which is what Postgres `time` columns return through PostgREST.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serializer};

pub fn parse(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

pub fn format(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(time))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {}", raw)))
}
