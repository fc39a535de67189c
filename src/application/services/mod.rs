//! Application services - Business logic orchestration

pub mod message_service;
pub mod tracker;

pub use message_service::MessageService;
pub use tracker::{CommandRequest, Outcome, SleepTracker, TrackerSettings};
