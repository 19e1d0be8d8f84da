//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not in
//! generation logic. Generation errors are `DomainError` from
//! `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// A section anchor was edited out of an aggregate file. Reported as a
    /// warning; the section is re-created at the end of the file.
    #[error("Anchor for section '{section}' not found in {path}; appended api '{api}' at end of file")]
    PatchAnchorNotFound {
        path: PathBuf,
        section: String,
        api: String,
    },

    /// The configured features directory does not exist.
    #[error("Features directory not found: {path}")]
    FeaturesDirNotFound { path: PathBuf },

    /// A feature requested by name has no pages.
    #[error("Feature not found: {name}")]
    FeatureNotFound { name: String, available: Vec<String> },

    /// A page requested by name does not exist in any selected feature.
    #[error("Page not found: {name}")]
    PageNotFound { name: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::PatchAnchorNotFound { section, .. } => vec![
                format!("Restore '// strata:anchor {}' inside the section", section),
                "Or move the appended block back by hand".into(),
            ],
            Self::FeaturesDirNotFound { path } => vec![
                format!("Create {} or point 'features_dir' at your features", path.display()),
                "Try: strata config get features_dir".into(),
            ],
            Self::FeatureNotFound { available, .. } if !available.is_empty() => vec![
                "Available features:".into(),
                format!("  {}", available.join(", ")),
            ],
            Self::FeatureNotFound { .. } => vec![
                "No features with a json2dart/json2dart.yaml were found".into(),
                "Try: strata list".into(),
            ],
            Self::PageNotFound { .. } => vec!["Try: strata list to see discovered pages".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FilesystemError { .. } => ErrorCategory::Io,
            Self::PatchAnchorNotFound { .. } => ErrorCategory::Internal,
            Self::FeaturesDirNotFound { .. }
            | Self::FeatureNotFound { .. }
            | Self::PageNotFound { .. } => ErrorCategory::NotFound,
        }
    }
}
