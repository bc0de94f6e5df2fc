//! Error types for Schemata operations.
//!
//! This module provides the main error type [`SchemataError`]. Name
//! collisions and broken foreign key references are deliberately absent:
//! the former are resolved by suffix generation and the latter simply
//! leave a connection out.

use std::{fmt, io};

use thiserror::Error;

use schemata_core::kind::FigureKind;

/// Result type used throughout the engine.
pub type Result<T, E = SchemataError> = std::result::Result<T, E>;

/// The main error type for Schemata operations.
#[derive(Debug, Error)]
pub enum SchemataError {
    /// Placement was requested for a kind that cannot be instantiated.
    #[error("cannot place a {0}: the kind has no placement tool")]
    InvalidKind(FigureKind),

    /// The user declined a confirmation; the operation was rolled back.
    #[error("operation cancelled")]
    UserCancelled,

    /// An id does not name a live entity of the expected kind.
    #[error("{0} does not exist")]
    NotFound(String),

    /// The operation is structurally invalid for its arguments.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SchemataError {
    /// Create a `NotFound` error for any displayable id.
    pub fn not_found(id: impl fmt::Display) -> Self {
        Self::NotFound(id.to_string())
    }

    /// Create an `InvalidOperation` error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Returns a stable code for diagnostics output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidKind(_) => "S001",
            Self::UserCancelled => "S002",
            Self::NotFound(_) => "S003",
            Self::InvalidOperation(_) => "S004",
            Self::Config(_) => "S005",
            Self::Io(_) => "S006",
        }
    }

    /// Returns a hint on how to resolve the error, if one applies.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::InvalidKind(_) => {
                Some("only tables, views, routine groups, notes, images and layers can be placed")
            }
            Self::UserCancelled => Some("the model was left unchanged"),
            Self::NotFound(_) => Some("the element may have been deleted by an earlier step"),
            Self::Config(_) => Some("check the configuration file for typos and invalid colors"),
            Self::InvalidOperation(_) | Self::Io(_) => None,
        }
    }

    /// Returns `true` if the error stems from a declined confirmation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::UserCancelled)
    }
}

#[cfg(test)]
mod tests {
    use schemata_core::identifier::FigureId;

    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            SchemataError::InvalidKind(FigureKind::Routine).to_string(),
            "cannot place a routine: the kind has no placement tool"
        );
        assert_eq!(
            SchemataError::not_found(FigureId::from_raw(3)).to_string(),
            "figure#3 does not exist"
        );
        assert_eq!(SchemataError::UserCancelled.to_string(), "operation cancelled");
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            SchemataError::InvalidKind(FigureKind::Schema),
            SchemataError::UserCancelled,
            SchemataError::not_found("x"),
            SchemataError::invalid("x"),
            SchemataError::Config("x".to_string()),
            SchemataError::Io(io::Error::other("x")),
        ];
        let mut codes: Vec<&str> = errors.iter().map(SchemataError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_is_cancelled() {
        assert!(SchemataError::UserCancelled.is_cancelled());
        assert!(!SchemataError::invalid("nope").is_cancelled());
    }
}
