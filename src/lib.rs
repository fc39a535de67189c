//! Sleep tracker bot
//!
//! Users log falling asleep and waking up with chat commands; the bot stores
//! the intervals in SQLite and reports durations, averages and per-day history.

pub mod application;
pub mod domain;
pub mod infrastructure;
