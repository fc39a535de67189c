//! State guards and value invariants shared by the store and the processor

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a command was declined without touching any data
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    #[error("user is not registered")]
    NotRegistered,

    #[error("user is already asleep")]
    AlreadyAsleep,

    #[error("user is not asleep")]
    NotAsleep,

    #[error("user has not woken up yet")]
    NotAwake,

    #[error("annotation is already set")]
    AlreadySet,

    #[error("no sleep record to annotate")]
    NoRecord,

    #[error("value is out of range")]
    InvalidValue,
}

/// Whether quality scores outside 1..=10 are rejected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QualityPolicy {
    #[default]
    Strict,
    /// Accept any integer
    Unchecked,
}

impl QualityPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            QualityPolicy::Strict
        } else {
            QualityPolicy::Unchecked
        }
    }
}

/// A validated sleep quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(i64);

impl Quality {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 10;

    pub fn new(value: i64, policy: QualityPolicy) -> Result<Self, Refusal> {
        match policy {
            QualityPolicy::Strict if !(Self::MIN..=Self::MAX).contains(&value) => {
                Err(Refusal::InvalidValue)
            }
            _ => Ok(Self(value)),
        }
    }

    /// Rows already in the database were validated on the way in
    pub(crate) fn from_stored(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exact elapsed seconds between two timestamps, at microsecond resolution
pub fn elapsed_secs(sleep_time: NaiveDateTime, wake_time: NaiveDateTime) -> f64 {
    let delta = wake_time - sleep_time;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

/// Advisory only: the interval is stored either way
pub fn is_long_sleep(duration_secs: f64, threshold: Duration) -> bool {
    duration_secs > threshold.num_seconds() as f64
}

/// Hours, minutes and seconds of a duration, each derived on its own from the total.
///
/// Seconds are rounded half-to-even and never carried into minutes, so `59.6` renders
/// as `0 часов, 0 минут, 60 секунд`. Existing reports were produced this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationParts {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl DurationParts {
    pub fn from_secs(total: f64) -> Self {
        let within_hour = total.rem_euclid(3600.0);
        Self {
            hours: total.div_euclid(3600.0) as i64,
            minutes: within_hour.div_euclid(60.0) as i64,
            seconds: within_hour.rem_euclid(60.0).round_ties_even() as i64,
        }
    }
}

impl fmt::Display for DurationParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} часов, {} минут, {} секунд", self.hours, self.minutes, self.seconds)
    }
}
