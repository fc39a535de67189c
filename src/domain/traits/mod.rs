//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod clock;
pub mod store;

pub use bot::{Bot, BotInfo, KeyboardButton};
pub use clock::{Clock, LocalClock};
pub use store::{AverageScope, Averages, Registration, SleepStore, StoreResult};
