use super::UserId;
use crate::domain::rules::Quality;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic record identifier assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One sleep interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub sleep_time: NaiveDateTime,
    pub wake_time: Option<NaiveDateTime>,
    /// Seconds between sleep and wake, stored once when the interval closes
    pub duration_secs: Option<f64>,
    pub quality: Option<Quality>,
    pub notes: Option<String>,
}

impl SleepRecord {
    pub fn is_open(&self) -> bool {
        self.wake_time.is_none()
    }

    /// Quality or notes have been recorded
    pub fn is_annotated(&self) -> bool {
        self.quality.is_some() || self.notes.is_some()
    }
}

/// Result of closing an open record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedInterval {
    pub record: RecordId,
    pub sleep_time: NaiveDateTime,
    pub wake_time: NaiveDateTime,
    pub duration_secs: f64,
}
