//! The module contains the error the engine can throw.
//!
//! The errors most callers care about are:
//!
//! - [`InvalidCredentials`] thrown when a login attempt fails, whatever the
//!   reason, so callers cannot tell unknown users from wrong passwords.
//! - [`ExistingKey`] thrown when a username is already taken.
//! - [`Import`] thrown when an uploaded roster cannot be read.
//!
//!  [`InvalidCredentials`]: EngineError::InvalidCredentials
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Import`]: EngineError::Import
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Import failed: {0}")]
    Import(String),
    #[error("Export failed: {0}")]
    Export(String),
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Import(a), Self::Import(b)) => a == b,
            (Self::Export(a), Self::Export(b)) => a == b,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
