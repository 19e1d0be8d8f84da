//! Strata Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Strata
//! code generator, which turns JSON samples described in per-page
//! `json2dart.yaml` files into layered Dart code.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           strata-cli (CLI)              │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │    (GenerationService, PatchEngine)     │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │  (Driven: Loader, Filesystem, Format)   │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     strata-adapters (Infrastructure)    │
//! │ (YamlPageLoader, LocalFilesystem, etc)  │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (inference, naming, emit, aggregate)   │
//! │         No I/O                          │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use strata_core::application::{GenerationRequest, GenerationService};
//!
//! // Adapters are injected by the caller.
//! let service = GenerationService::new(loader, filesystem, formatter, settings);
//! let report = service.generate(&GenerationRequest::default()).await?;
//! assert!(report.is_success());
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ApplicationError, GenerationReport, GenerationRequest, GenerationService, UnitOutcome,
        UnitReport,
        ports::{Filesystem, Formatter, PageConfigLoader},
    };
    pub use crate::domain::{
        ApiDefinition, ApiEntry, DomainError, FeatureConfig, GeneratorSettings, PageConfig,
        PageLayout, RawApiConfig,
    };
    pub use crate::error::{ErrorCategory, StrataError, StrataResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
