//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only sees the
//! [`GeneratorSettings`] part of it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `STRATA_FEATURES_DIR`,
//!    `STRATA_GENERATOR__BASE_URL`, ...
//! 3. `--config FILE`, or `./strata.toml`
//! 4. The user configuration file
//! 5. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use strata_core::domain::GeneratorSettings;

use crate::cli::GlobalArgs;

/// File name of the project configuration.
pub const LOCAL_CONFIG_FILE: &str = "strata.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root holding `<feature>/<page>/json2dart/json2dart.yaml`.
    pub features_dir: PathBuf,
    /// Run `dart format` after every generation.
    pub format_after_generate: bool,
    /// Settings that shape the emitted Dart code.
    pub generator: GeneratorSettings,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            features_dir: PathBuf::from("lib/features"),
            format_after_generate: false,
            generator: GeneratorSettings::default(),
            output: OutputConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the user file, then the project
    /// file (or `config_file`), then `STRATA_*` environment variables.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("Failed to build default configuration")?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(global) = Self::global_config_path() {
            builder = builder.add_source(File::from(global).required(false));
        }
        builder = match config_file {
            Some(path) => builder.add_source(File::from(path.as_path()).required(true)),
            None => builder.add_source(File::from(Path::new(LOCAL_CONFIG_FILE)).required(false)),
        };
        builder = builder.add_source(
            Environment::with_prefix("STRATA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Apply flags that override configured values.
    pub fn with_overrides(mut self, args: &GlobalArgs) -> Self {
        if let Some(dir) = &args.features_dir {
            self.features_dir = dir.clone();
        }
        if args.no_color {
            self.output.no_color = true;
        }
        self
    }

    /// Path to the user configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness.
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "strata", "strata")
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// Files read by [`Self::load`], lowest priority first.
    pub fn sources(config_file: Option<&PathBuf>) -> Vec<PathBuf> {
        let mut sources: Vec<PathBuf> = Self::global_config_path().into_iter().collect();
        sources.push(
            config_file
                .cloned()
                .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE)),
        );
        sources
    }
}
