//! Application layer for Strata.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (GenerationService, PatchEngine)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! generation logic itself. Inference, naming and emission live in
//! `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    GenerationReport, GenerationRequest, GenerationService, PatchEngine, UnitOutcome, UnitReport,
};

// Re-export port traits (for adapter implementation)
pub use ports::{Filesystem, Formatter, PageConfigLoader};

pub use error::ApplicationError;
