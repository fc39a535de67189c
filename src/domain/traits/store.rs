use chrono::{NaiveDate, NaiveDateTime};

use crate::application::errors::StoreError;
use crate::domain::entities::{ClosedInterval, RecordId, SleepRecord, User, UserId};
use crate::domain::rules::Quality;

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of `register_user`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    AlreadyExists,
}

/// Which records `averages` aggregates over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AverageScope {
    #[default]
    Global,
    User(UserId),
}

/// Averages over closed records; `None` means there was nothing to average
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Averages {
    pub duration_secs: Option<f64>,
    pub quality: Option<f64>,
}

/// Store trait - durable users and sleep records.
///
/// Every method is one transaction. Guard violations come back as
/// `StoreError::Refused` and leave the data untouched.
pub trait SleepStore: Send + Sync {
    fn register_user(&self, id: UserId, name: &str) -> StoreResult<Registration>;
    fn user(&self, id: UserId) -> StoreResult<Option<User>>;
    fn record(&self, id: RecordId) -> StoreResult<Option<SleepRecord>>;

    /// Opens a record; refused with `AlreadyAsleep` while one is open
    fn begin_sleep(&self, user: UserId, at: NaiveDateTime) -> StoreResult<RecordId>;
    /// Closes the open record and stores its duration; refused with `NotAsleep`
    fn end_sleep(&self, user: UserId, at: NaiveDateTime) -> StoreResult<ClosedInterval>;

    fn set_quality(&self, user: UserId, quality: Quality) -> StoreResult<()>;
    fn set_notes(&self, user: UserId, notes: &str) -> StoreResult<()>;
    fn force_set_quality(&self, user: UserId, quality: Quality) -> StoreResult<()>;
    fn force_set_notes(&self, user: UserId, notes: &str) -> StoreResult<()>;

    /// Deletes the open record, or the last closed one while it is still unannotated.
    /// Returns whether anything was deleted.
    fn discard_open_record(&self, user: UserId) -> StoreResult<bool>;

    fn averages(&self, scope: AverageScope) -> StoreResult<Averages>;
    /// Closed records of `user` whose wake time falls on `date`, oldest first
    fn records_on_date(&self, user: UserId, date: NaiveDate) -> StoreResult<Vec<SleepRecord>>;
}
