//! Typed parsing of command arguments, done before anything touches the store

use chrono::NaiveDate;
use thiserror::Error;

/// Date argument format for `/date`
pub const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("missing argument")]
    Missing,

    #[error("not an integer: {0}")]
    NotInteger(String),

    #[error("not a DD.MM.YYYY date: {0}")]
    NotDate(String),
}

/// First whitespace-separated token as an integer
pub fn integer(args: &str) -> Result<i64, ArgumentError> {
    let token = args.split_whitespace().next().ok_or(ArgumentError::Missing)?;
    token
        .parse()
        .map_err(|_| ArgumentError::NotInteger(token.to_string()))
}

/// The whole argument text, trimmed; blank is missing
pub fn text(args: &str) -> Result<&str, ArgumentError> {
    match args.trim() {
        "" => Err(ArgumentError::Missing),
        text => Ok(text),
    }
}

/// Last whitespace-separated token as `DD.MM.YYYY`
pub fn date(args: &str) -> Result<NaiveDate, ArgumentError> {
    let token = args.split_whitespace().last().ok_or(ArgumentError::Missing)?;
    NaiveDate::parse_from_str(token, DATE_FORMAT)
        .map_err(|_| ArgumentError::NotDate(token.to_string()))
}
