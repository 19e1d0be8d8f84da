//! Filesystem-based page configuration loader.
//!
//! Discovers `json2dart.yaml` files under the features directory and parses
//! them into [`FeatureConfig`]s for the generation service.
//!
//! # Directory layout expected
//!
//! ```text
//! lib/features/
//! ├── auth/
//! │   └── login/
//! │       └── json2dart/
//! │           ├── json2dart.yaml     ← page configuration
//! │           └── json/
//! │               └── response/login_response.json
//! └── home/
//!     └── feed/
//!         └── json2dart/json2dart.yaml
//! ```
//!
//! # `json2dart.yaml` format
//!
//! A mapping from API name to entry. Entry order is kept.
//!
//! ```yaml
//! login:
//!   method: post
//!   path: /auth/login
//!   body: json2dart/json/body/login_body.json
//!   response: json2dart/json/response/login_response.json
//! ```

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde_yaml::Value;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use strata_core::{
    application::{ApplicationError, ports::PageConfigLoader},
    domain::{
        ApiEntry, DomainError, FeatureConfig, PageConfig, RawApiConfig,
        project::{PAGE_CONFIG_DIR, PAGE_CONFIG_FILE},
    },
    error::StrataResult,
};

/// Loads pages from `<features_dir>/<feature>/<page>/json2dart/json2dart.yaml`.
///
/// A page whose file cannot be read or parsed is still returned; its
/// `entries` carry the error so the run can report it as a failed unit
/// without blocking other pages.
pub struct YamlPageLoader {
    features_dir: PathBuf,
}

impl YamlPageLoader {
    /// Create a loader pointed at `features_dir`.
    ///
    /// The directory does not need to exist yet; [`PageConfigLoader::discover`]
    /// returns an error if it is missing when called.
    pub fn new(features_dir: impl Into<PathBuf>) -> Self {
        Self {
            features_dir: features_dir.into(),
        }
    }

    pub fn features_dir(&self) -> &Path {
        &self.features_dir
    }

    fn load_page(&self, feature: &str, page: &str, config_file: &Path) -> PageConfig {
        let dir = self.features_dir.join(feature).join(page);
        let entries = fs::read_to_string(config_file)
            .map_err(|e| DomainError::InvalidPageConfig {
                path: config_file.to_path_buf(),
                reason: e.to_string(),
            })
            .and_then(|content| parse_page_config(&content, config_file));

        match &entries {
            Ok(entries) => debug!(feature, page, apis = entries.len(), "loaded page"),
            Err(e) => warn!(feature, page, error = %e, "page configuration unreadable"),
        }

        PageConfig {
            feature: feature.to_string(),
            name: page.to_string(),
            dir,
            config_file: config_file.to_path_buf(),
            entries,
        }
    }
}

impl PageConfigLoader for YamlPageLoader {
    #[instrument(skip(self), fields(dir = %self.features_dir.display()))]
    fn discover(&self) -> StrataResult<Vec<FeatureConfig>> {
        if !self.features_dir.is_dir() {
            return Err(ApplicationError::FeaturesDirNotFound {
                path: self.features_dir.clone(),
            }
            .into());
        }

        let mut features: BTreeMap<String, Vec<PageConfig>> = BTreeMap::new();

        // feature / page / json2dart / json2dart.yaml
        let walker = WalkDir::new(&self.features_dir)
            .min_depth(4)
            .max_depth(4)
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || entry.file_name() != PAGE_CONFIG_FILE {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.features_dir) else {
                continue;
            };
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let [feature, page, config_dir, _] = parts.as_slice() else {
                continue;
            };
            if config_dir != PAGE_CONFIG_DIR {
                continue;
            }

            let loaded = self.load_page(feature, page, entry.path());
            features.entry(feature.clone()).or_default().push(loaded);
        }

        debug!(count = features.len(), "finished discovering features");
        Ok(features
            .into_iter()
            .map(|(name, mut pages)| {
                pages.sort_by(|a, b| a.name.cmp(&b.name));
                FeatureConfig { name, pages }
            })
            .collect())
    }
}

/// Parse the content of one `json2dart.yaml`.
///
/// An empty file has no entries. Each entry that cannot be read as an API
/// configuration is kept with its error so that only that API fails.
pub fn parse_page_config(content: &str, path: &Path) -> Result<Vec<ApiEntry>, DomainError> {
    let document: Value =
        serde_yaml::from_str(content).map_err(|e| DomainError::InvalidPageConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mapping = match document {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(DomainError::InvalidPageConfig {
                path: path.to_path_buf(),
                reason: "top level must be a mapping of api name to entry".into(),
            });
        }
    };

    Ok(mapping
        .into_iter()
        .map(|(key, value)| {
            let name = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => format!("{other:?}"),
            };
            let config = match value {
                Value::Mapping(_) => serde_yaml::from_value::<RawApiConfig>(value)
                    .map_err(|e| e.to_string()),
                _ => Err("expected a mapping of api settings".to_string()),
            };
            ApiEntry { name, config }
        })
        .collect())
}
