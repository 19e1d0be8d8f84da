// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (reports keep them after the run)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Required field missing for api '{api}': {field}")]
    MissingRequiredField { api: String, field: &'static str },

    #[error("Invalid value for '{field}' in api '{api}': {value}")]
    InvalidApiValue {
        api: String,
        field: &'static str,
        value: String,
        expected: &'static [&'static str],
    },

    #[error("Invalid api '{api}': {reason}")]
    InvalidApi { api: String, reason: String },

    #[error("Api '{api}' clashes with '{other}' on the same page: both generate '{stem}'")]
    ApiNameClash {
        api: String,
        other: String,
        stem: String,
    },

    #[error("Invalid page configuration {path}: {reason}")]
    InvalidPageConfig { path: PathBuf, reason: String },

    // ========================================================================
    // Sample Errors
    // ========================================================================
    #[error("Invalid sample {path}: {reason}")]
    SampleFormat { path: PathBuf, reason: String },

    // ========================================================================
    // Aggregate Document Errors
    // ========================================================================
    #[error("Malformed generated block '{key}' at line {line}: {reason}")]
    MalformedBlock {
        key: String,
        line: usize,
        reason: String,
    },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingRequiredField { api, field } => vec![
                format!("Add '{}' to the '{}' entry in json2dart.yaml", field, api),
                "Every api entry needs at least 'method' and 'path'".into(),
            ],
            Self::InvalidApiValue {
                field, expected, ..
            } => vec![
                format!("Valid values for '{}':", field),
                format!("  {}", expected.join(", ")),
            ],
            Self::InvalidApi { reason, .. } => vec![
                "Check the api entry in json2dart.yaml".into(),
                format!("Details: {}", reason),
            ],
            Self::ApiNameClash { api, other, .. } => vec![
                format!("Rename '{}' or '{}' in json2dart.yaml", api, other),
                "Api names are compared after snake_case and PascalCase conversion".into(),
            ],
            Self::InvalidPageConfig { path, .. } => vec![
                format!("Fix the YAML syntax in {}", path.display()),
                "The top level must be a mapping of api name to api settings".into(),
            ],
            Self::SampleFormat { path, .. } => vec![
                format!("Check that {} exists and contains valid JSON", path.display()),
                "The sample root must be a JSON object or an array of objects".into(),
            ],
            Self::MalformedBlock { key, .. } => vec![
                format!("Restore the strata markers around '{}'", key),
                "Or delete the generated file to have it recreated".into(),
            ],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingRequiredField { .. }
            | Self::InvalidApiValue { .. }
            | Self::InvalidApi { .. }
            | Self::ApiNameClash { .. }
            | Self::InvalidPageConfig { .. } => ErrorCategory::Configuration,
            Self::SampleFormat { .. } => ErrorCategory::Sample,
            Self::MalformedBlock { .. } => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Sample,
    Internal,
}
