//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (User, SleepRecord, Message, Command)
//! - Traits: Abstractions for infrastructure (Bot, SleepStore, Clock)
//! - Rules: State guards and value invariants

pub mod entities;
pub mod rules;
pub mod traits;
