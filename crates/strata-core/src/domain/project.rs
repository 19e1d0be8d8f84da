//! Project hierarchy: features, pages, and where a page's output lives.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::api::ApiEntry;
use crate::domain::error::DomainError;
use crate::domain::ident::snake;

/// Directory (relative to a page) holding its `json2dart.yaml`.
pub const PAGE_CONFIG_DIR: &str = "json2dart";
/// File name of a page configuration.
pub const PAGE_CONFIG_FILE: &str = "json2dart.yaml";

/// Settings that shape emitted code, shared by every page of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Dart expression used when an API has no `base_url` of its own.
    pub base_url: String,
    /// Class name of the HTTP client injected into data sources.
    pub http_client: String,
    /// Import that brings the client and `CacheStrategy` into scope.
    pub http_client_import: Option<String>,
    /// Method called on `DateTime` values written by Body classes.
    pub date_format_body: String,
    /// Method called on `DateTime` values written by Response classes.
    pub date_format_response: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            base_url: "ApiConfig.baseUrl".into(),
            http_client: "ApiClient".into(),
            http_client_import: None,
            date_format_body: "toIso8601String()".into(),
            date_format_response: "toIso8601String()".into(),
        }
    }
}

/// One page: a directory with a `json2dart/json2dart.yaml` and the code
/// generated next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PageConfig {
    pub feature: String,
    pub name: String,
    pub dir: PathBuf,
    pub config_file: PathBuf,
    /// Parsed entries in file order, or the reason the file was unreadable.
    pub entries: Result<Vec<ApiEntry>, DomainError>,
}

impl PageConfig {
    pub fn layout(&self) -> PageLayout {
        PageLayout::new(&self.dir, &self.name)
    }

    pub fn api_names(&self) -> Vec<&str> {
        match &self.entries {
            Ok(entries) => entries.iter().map(|e| e.name.as_str()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Resolve a path from the configuration against the page directory.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.dir.join(relative)
        }
    }
}

/// A feature and its pages, sorted by page name.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureConfig {
    pub name: String,
    pub pages: Vec<PageConfig>,
}

impl FeatureConfig {
    pub fn api_count(&self) -> usize {
        self.pages.iter().map(|p| p.api_names().len()).sum()
    }
}

/// Output paths of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    root: PathBuf,
    page: String,
}

impl PageLayout {
    pub fn new(root: &Path, page: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            page: snake(page),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn body_file(&self, api: &str) -> PathBuf {
        self.root.join(Self::body_rel(api))
    }

    pub fn response_file(&self, api: &str) -> PathBuf {
        self.root.join(Self::response_rel(api))
    }

    pub fn entity_file(&self, api: &str) -> PathBuf {
        self.root.join(Self::entity_rel(api))
    }

    pub fn use_case_file(&self, api: &str) -> PathBuf {
        self.root
            .join("domain/usecases")
            .join(format!("{}_use_case.dart", snake(api)))
    }

    pub fn remote_data_source_file(&self) -> PathBuf {
        self.root
            .join("data/datasources")
            .join(format!("{}_remote_data_source.dart", self.page))
    }

    pub fn repository_file(&self) -> PathBuf {
        self.root
            .join("domain/repositories")
            .join(format!("{}_repository.dart", self.page))
    }

    pub fn repository_impl_file(&self) -> PathBuf {
        self.root
            .join("data/repositories")
            .join(format!("{}_repository_impl.dart", self.page))
    }

    pub fn mapper_file(&self) -> PathBuf {
        self.root
            .join("data/mappers")
            .join(format!("{}_mapper.dart", self.page))
    }

    /// Relative path of the Body model, as used in per-API file layouts.
    pub fn body_rel(api: &str) -> PathBuf {
        PathBuf::from("data/models/body").join(format!("{}_body.dart", snake(api)))
    }

    pub fn response_rel(api: &str) -> PathBuf {
        PathBuf::from("data/models/response").join(format!("{}_response.dart", snake(api)))
    }

    pub fn entity_rel(api: &str) -> PathBuf {
        PathBuf::from("domain/entities").join(format!("{}_entity.dart", snake(api)))
    }

    /// Dart import path from the directory of `from` to `to`, both inside
    /// this page.
    pub fn import_between(&self, from: &Path, to: &Path) -> String {
        let from_dir = from
            .strip_prefix(&self.root)
            .unwrap_or(from)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let to_rel = to.strip_prefix(&self.root).unwrap_or(to);
        relative_import(&from_dir, to_rel)
    }
}

fn relative_import(from_dir: &Path, to: &Path) -> String {
    let from: Vec<_> = from_dir.components().collect();
    let target: Vec<_> = to.components().collect();
    let common = from
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = std::iter::repeat_n("..".to_string(), from.len() - common).collect();
    parts.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}
