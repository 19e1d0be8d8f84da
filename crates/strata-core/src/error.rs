//! Unified error handling for strata core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for strata core operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StrataError {
    /// Errors from the domain layer (configuration and sample problems).
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (I/O and discovery failures).
    #[error("{0}")]
    Application(#[from] ApplicationError),

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl StrataError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Internal { .. } => vec![
                "This appears to be a bug in strata".into(),
                "Please report it together with the command you ran".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Configuration => ErrorCategory::Configuration,
                crate::domain::ErrorCategory::Sample => ErrorCategory::Sample,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Sample,
    NotFound,
    Io,
    Internal,
}

/// Convenient result type alias.
pub type StrataResult<T> = Result<T, StrataError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn categories_follow_the_wrapped_error() {
        let err: StrataError = DomainError::SampleFormat {
            path: PathBuf::from("a.json"),
            reason: "eof".into(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Sample);

        let err: StrataError = ApplicationError::FilesystemError {
            path: PathBuf::from("a"),
            reason: "denied".into(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Io);
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn display_is_the_inner_message() {
        let err: StrataError = DomainError::MissingRequiredField {
            api: "login".into(),
            field: "path",
        }
        .into();
        assert_eq!(err.to_string(), "Required field missing for api 'login': path");
    }
}
