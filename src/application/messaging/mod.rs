//! Message handling - Parsing, argument validation, dispatching

pub mod arguments;
pub mod dispatcher;
pub mod parser;

pub use dispatcher::MessageDispatcher;
pub use parser::MessageParser;
