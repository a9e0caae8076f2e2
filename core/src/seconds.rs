//! Serde adapter that stores [`Duration`] values as fractional seconds.
//!
//! Sector manifests are written by hand, so `fire_rate = 0.25` reads better
//! than serde's default `{ secs, nanos }` table.

use std::time::Duration;

use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

/// Serializes a duration as a floating point number of seconds.
pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(value.as_secs_f64())
}

/// Deserializes a duration from a non-negative floating point number of seconds.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(raw).map_err(D::Error::custom)
}
