//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Command processing and reply delivery
//! - Messaging: Message parsing, argument validation, dispatching
//! - Replies: Outcome rendering
//! - Errors: Application errors

pub mod errors;
pub mod messaging;
pub mod replies;
pub mod services;
