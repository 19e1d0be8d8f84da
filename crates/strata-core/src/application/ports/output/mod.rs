//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `strata-adapters` crate provides implementations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::FeatureConfig;
use crate::error::StrataResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `strata_adapters::filesystem::LocalFilesystem` (production)
/// - `strata_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Read a UTF-8 file. `Ok(None)` when it does not exist.
    async fn read_to_string(&self, path: &Path) -> StrataResult<Option<String>>;

    /// Write a file, creating parent directories as needed.
    async fn write(&self, path: &Path, content: &str) -> StrataResult<()>;

    /// Check if path exists.
    async fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    async fn create_dir_all(&self, path: &Path) -> StrataResult<()>;
}

/// Port for discovering page configurations.
///
/// Implemented by:
/// - `strata_adapters::page_loader::YamlPageLoader`
#[cfg_attr(test, mockall::automock)]
pub trait PageConfigLoader: Send + Sync {
    /// All features under the features directory, sorted by name, each with
    /// its pages sorted by name. A page whose file cannot be parsed is still
    /// returned, carrying the parse error.
    fn discover(&self) -> StrataResult<Vec<FeatureConfig>>;
}

/// Port for the external source formatter.
///
/// Implemented by:
/// - `strata_adapters::formatter::DartFormatter`
/// - `strata_adapters::formatter::NoopFormatter`
#[cfg_attr(test, mockall::automock)]
pub trait Formatter: Send + Sync {
    /// Start formatting `paths`. Does not wait for completion and never
    /// fails the run.
    fn format(&self, paths: &[PathBuf]);
}
