//! Error adapter for converting SchemataError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error type
//! and miette's rich diagnostic formatting used in the CLI. Scenario errors
//! carry no source spans, so a report is the message plus the error code
//! and a hint.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use schemata::SchemataError;

/// Adapter for a [`SchemataError`].
pub struct ErrorAdapter<'a>(pub &'a SchemataError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("schemata::{}", self.0.code())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.0
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Convert a [`SchemataError`] into a reportable error.
pub fn to_reportable(err: &SchemataError) -> ErrorAdapter<'_> {
    ErrorAdapter(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_help() {
        let err = SchemataError::UserCancelled;
        let adapter = to_reportable(&err);

        assert_eq!(adapter.to_string(), "operation cancelled");
        assert_eq!(adapter.code().unwrap().to_string(), "schemata::S002");
        assert_eq!(
            adapter.help().unwrap().to_string(),
            "the model was left unchanged"
        );
        assert!(adapter.labels().is_none());
    }

    #[test]
    fn test_error_without_help() {
        let err = SchemataError::invalid("the root layer cannot be deleted");
        let adapter = to_reportable(&err);

        assert_eq!(
            adapter.to_string(),
            "invalid operation: the root layer cannot be deleted"
        );
        assert!(adapter.help().is_none());
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = SchemataError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let adapter = to_reportable(&err);

        assert_eq!(adapter.code().unwrap().to_string(), "schemata::S006");
        assert!(std::error::Error::source(&adapter).is_some());
    }
}
