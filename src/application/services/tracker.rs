//! Command processor: per-user state machine over the sleep store

use chrono::{Duration, NaiveDate};
use std::sync::Arc;

use crate::application::errors::StoreError;
use crate::application::messaging::arguments::{self, ArgumentError};
use crate::domain::entities::{ClosedInterval, Command, RecordId, SleepRecord, UserId};
use crate::domain::rules::{is_long_sleep, Quality, QualityPolicy, Refusal};
use crate::domain::traits::{AverageScope, Averages, Clock, Registration, SleepStore};
use crate::infrastructure::config::{AverageScopeSetting, TrackerConfig};

/// One inbound command, already separated from the transport
#[derive(Debug, Clone, Copy)]
pub struct CommandRequest<'a> {
    pub user_id: UserId,
    pub display_name: &'a str,
    /// Command name without prefix
    pub command: &'a str,
    pub args: &'a str,
}

/// What happened, for the reply renderer
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Welcome { name: String, registration: Registration },
    Help,
    SleepStarted(RecordId),
    Woke {
        interval: ClosedInterval,
        /// Set to the threshold in hours when the interval exceeded it
        long_sleep_hours: Option<i64>,
    },
    QualitySaved,
    NotesSaved,
    QualityChanged,
    NotesChanged,
    Deleted { discarded: bool },
    Averages(Averages),
    DayReport { date: NaiveDate, records: Vec<SleepRecord> },
    Refused { command: Command, refusal: Refusal },
    BadArgument { command: Command, error: ArgumentError },
    UnknownCommand(String),
    NotACommand,
    /// Storage failed; the user gets a generic apology
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct TrackerSettings {
    pub quality_policy: QualityPolicy,
    pub long_sleep: Duration,
    pub average_scope: AverageScopeSetting,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::from(&TrackerConfig::default())
    }
}

impl From<&TrackerConfig> for TrackerSettings {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            quality_policy: config.quality_policy(),
            long_sleep: Duration::hours(i64::from(config.long_sleep_hours)),
            average_scope: config.average_scope,
        }
    }
}

enum Failure {
    Argument(ArgumentError),
    Store(StoreError),
}

impl From<ArgumentError> for Failure {
    fn from(e: ArgumentError) -> Self {
        Failure::Argument(e)
    }
}

impl From<StoreError> for Failure {
    fn from(e: StoreError) -> Self {
        Failure::Store(e)
    }
}

impl From<Refusal> for Failure {
    fn from(r: Refusal) -> Self {
        Failure::Store(StoreError::Refused(r))
    }
}

/// Validates commands against the user's state and applies them to the store
pub struct SleepTracker {
    store: Arc<dyn SleepStore>,
    clock: Arc<dyn Clock>,
    settings: TrackerSettings,
}

impl SleepTracker {
    pub fn new(store: Arc<dyn SleepStore>, clock: Arc<dyn Clock>, settings: TrackerSettings) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn SleepStore> {
        &self.store
    }

    /// Every request yields exactly one outcome; nothing is dropped
    pub fn handle(&self, request: &CommandRequest<'_>) -> Outcome {
        let Some(command) = Command::from_name(request.command) else {
            tracing::debug!("Unknown command /{} from {}", request.command, request.user_id);
            return Outcome::UnknownCommand(request.command.to_string());
        };

        let outcome = match self.execute(command, request) {
            Ok(outcome) => outcome,
            Err(Failure::Argument(error)) => Outcome::BadArgument { command, error },
            Err(Failure::Store(StoreError::Refused(refusal))) => Outcome::Refused { command, refusal },
            Err(Failure::Store(e)) => {
                tracing::error!("{} failed for user {}: {}", command, request.user_id, e);
                Outcome::Failed
            }
        };
        tracing::debug!("{} from {} -> {:?}", command, request.user_id, outcome);
        outcome
    }

    fn execute(&self, command: Command, request: &CommandRequest<'_>) -> Result<Outcome, Failure> {
        let user = request.user_id;
        let outcome = match command {
            Command::Start => {
                let registration = self.store.register_user(user, request.display_name)?;
                if registration == Registration::Created {
                    tracing::info!("Registered user {} ({})", user, request.display_name);
                }
                Outcome::Welcome {
                    name: request.display_name.to_string(),
                    registration,
                }
            }
            Command::Help => Outcome::Help,
            Command::Sleep => Outcome::SleepStarted(self.store.begin_sleep(user, self.clock.now())?),
            Command::Wake => {
                let interval = self.store.end_sleep(user, self.clock.now())?;
                let long_sleep_hours = is_long_sleep(interval.duration_secs, self.settings.long_sleep)
                    .then(|| self.settings.long_sleep.num_hours());
                Outcome::Woke {
                    interval,
                    long_sleep_hours,
                }
            }
            Command::Quality => {
                self.store.set_quality(user, self.quality(request.args)?)?;
                Outcome::QualitySaved
            }
            Command::Notes => {
                self.store.set_notes(user, arguments::text(request.args)?)?;
                Outcome::NotesSaved
            }
            Command::ChangeQuality => {
                self.store.force_set_quality(user, self.quality(request.args)?)?;
                Outcome::QualityChanged
            }
            Command::ChangeNotes => {
                self.store.force_set_notes(user, arguments::text(request.args)?)?;
                Outcome::NotesChanged
            }
            Command::Delete => Outcome::Deleted {
                discarded: self.store.discard_open_record(user)?,
            },
            Command::Average => {
                let scope = match self.settings.average_scope {
                    AverageScopeSetting::Global => AverageScope::Global,
                    AverageScopeSetting::Requester => AverageScope::User(user),
                };
                Outcome::Averages(self.store.averages(scope)?)
            }
            Command::Date => {
                let date = arguments::date(request.args)?;
                Outcome::DayReport {
                    date,
                    records: self.store.records_on_date(user, date)?,
                }
            }
        };
        Ok(outcome)
    }

    fn quality(&self, args: &str) -> Result<Quality, Failure> {
        let value = arguments::integer(args)?;
        Ok(Quality::new(value, self.settings.quality_policy)?)
    }
}
