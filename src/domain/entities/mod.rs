//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod message;
pub mod sleep_record;
pub mod user;

pub use command::Command;
pub use message::{Content, Message};
pub use sleep_record::{ClosedInterval, RecordId, SleepRecord};
pub use user::{Sender, User, UserId, UserState};
