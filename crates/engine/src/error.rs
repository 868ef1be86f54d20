//! The module contains the errors the engine can return.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] returned when a referenced record does not exist.
//! - [`ExistingKey`] returned when a unique key (course name, client email)
//!   is already taken.
//! - [`Validation`] returned when a business rule rejects the input.
//! - [`InvalidFormat`] returned when an import file is malformed.
//! - [`Database`] for any other storage failure.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidFormat`]: EngineError::InvalidFormat
//!  [`Database`]: EngineError::Database
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
///
/// The `Display` text is meant to be shown to the user as is.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
    #[error("Export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Database(DbErr),
}

/// Storage constraint violations are surfaced as domain errors. The store's
/// message is never passed through: a unique violation keeps only the
/// violated `table.column`, a foreign-key violation names no key at all.
///
/// Writes that know the value they tried to store map unique violations to
/// that value instead.
impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => Self::ExistingKey(violated_key(&msg)),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                Self::KeyNotFound("referenced record".to_string())
            }
            _ => Self::Database(err),
        }
    }
}

/// `UNIQUE constraint failed: courses.name` -> `courses.name`.
fn violated_key(msg: &str) -> String {
    msg.rsplit_once(": ")
        .map_or(msg, |(_, key)| key)
        .trim()
        .to_string()
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidFormat(a), Self::InvalidFormat(b)) => a == b,
            (Self::Export(a), Self::Export(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
