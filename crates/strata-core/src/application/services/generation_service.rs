//! Generation Service - main application orchestrator.
//!
//! This service coordinates a whole generation run:
//! 1. Discover features and pages through the loader port
//! 2. Generate each API: validate, infer, name, emit
//! 3. Write per-API files and patch the page's aggregate files
//! 4. Optionally hand written files to the formatter
//!
//! Failures are isolated per API: one bad entry or sample never stops its
//! siblings, and the run always ends with a complete report.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, Formatter, PageConfigLoader},
        services::patch_service::PatchEngine,
    },
    domain::{
        ApiDefinition, ApiEntry, ApiInput, ArtifactFragment, ClassNameRegistry, DomainError,
        FeatureConfig, GeneratedFile, GeneratorSettings, PageConfig, SampleValue, emit_api,
        infer_document, infer_sample, name_clashes,
    },
    error::{StrataError, StrataResult},
};

// ── Request and report ────────────────────────────────────────────────────────

/// What to generate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Feature names; empty means every feature.
    pub features: Vec<String>,
    /// Restrict to a single page name.
    pub page: Option<String>,
    /// Run the formatter over written files.
    pub format: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Generated,
    Failed(StrataError),
}

/// Result of one API, or of a page whose configuration could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub feature: String,
    pub page: String,
    /// `None` for a page-level failure.
    pub api: Option<String>,
    pub outcome: UnitOutcome,
    pub warnings: Vec<ApplicationError>,
    pub written: Vec<PathBuf>,
}

impl UnitReport {
    fn new(page: &PageConfig, api: Option<&str>) -> Self {
        Self {
            feature: page.feature.clone(),
            page: page.name.clone(),
            api: api.map(str::to_string),
            outcome: UnitOutcome::Generated,
            warnings: Vec::new(),
            written: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Generated)
    }

    pub fn error(&self) -> Option<&StrataError> {
        match &self.outcome {
            UnitOutcome::Failed(err) => Some(err),
            UnitOutcome::Generated => None,
        }
    }

    /// `feature/page/api`, or `feature/page` for page-level units.
    pub fn label(&self) -> String {
        match &self.api {
            Some(api) => format!("{}/{}/{}", self.feature, self.page, api),
            None => format!("{}/{}", self.feature, self.page),
        }
    }
}

/// Result of one feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureReport {
    pub feature: String,
    pub units: Vec<UnitReport>,
}

/// Result of a whole run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationReport {
    pub units: Vec<UnitReport>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.units.iter().all(UnitReport::is_success)
    }

    pub fn failed(&self) -> Vec<&UnitReport> {
        self.units.iter().filter(|u| !u.is_success()).collect()
    }

    pub fn succeeded(&self) -> usize {
        self.units.iter().filter(|u| u.is_success()).count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ApplicationError> {
        self.units.iter().flat_map(|u| u.warnings.iter())
    }

    /// Every file written, in unit order, without duplicates.
    pub fn written(&self) -> Vec<PathBuf> {
        let mut seen = std::collections::HashSet::new();
        self.units
            .iter()
            .flat_map(|u| u.written.iter())
            .filter(|p| seen.insert((*p).clone()))
            .cloned()
            .collect()
    }

    fn extend(&mut self, feature: FeatureReport) {
        self.units.extend(feature.units);
    }
}

// ── Sample cache ──────────────────────────────────────────────────────────────

/// Parsed JSON documents of one page. Several APIs of a page often share a
/// sample or a header file.
#[derive(Debug, Default)]
pub struct SampleCache {
    entries: HashMap<PathBuf, Result<SampleValue, DomainError>>,
}

impl SampleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load and parse `path`, once per page.
    pub async fn load(
        &mut self,
        filesystem: &dyn Filesystem,
        path: &Path,
    ) -> StrataResult<SampleValue> {
        if let Some(cached) = self.entries.get(path) {
            return cached.clone().map_err(StrataError::from);
        }

        let parsed = match filesystem.read_to_string(path).await {
            Ok(None) => Err(DomainError::SampleFormat {
                path: path.to_path_buf(),
                reason: "file not found".into(),
            }),
            Ok(Some(content)) => {
                serde_json::from_str::<Value>(&content).map_err(|e| DomainError::SampleFormat {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
            Err(err) => Err(DomainError::SampleFormat {
                path: path.to_path_buf(),
                reason: format!("unreadable: {err}"),
            }),
        };
        self.entries.insert(path.to_path_buf(), parsed.clone());
        parsed.map_err(StrataError::from)
    }
}

/// Features per batch: half the features, rounded up, bounded by the
/// available parallelism.
pub fn batch_size(features: usize, parallelism: usize) -> usize {
    features.div_ceil(2).clamp(1, parallelism.max(1))
}

// ── Service ───────────────────────────────────────────────────────────────────

/// Main generation service.
pub struct GenerationService {
    loader: Box<dyn PageConfigLoader>,
    filesystem: Box<dyn Filesystem>,
    formatter: Box<dyn Formatter>,
    settings: GeneratorSettings,
}

impl GenerationService {
    /// Create a new generation service with the given adapters.
    pub fn new(
        loader: Box<dyn PageConfigLoader>,
        filesystem: Box<dyn Filesystem>,
        formatter: Box<dyn Formatter>,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            loader,
            filesystem,
            formatter,
            settings,
        }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Discovered features, unfiltered.
    pub fn discover(&self) -> StrataResult<Vec<FeatureConfig>> {
        self.loader.discover()
    }

    /// Run a request end to end.
    ///
    /// Discovery and selection errors are returned as `Err`; everything
    /// after that is reported per unit.
    #[instrument(skip_all, fields(features = ?request.features, page = ?request.page))]
    pub async fn generate(&self, request: &GenerationRequest) -> StrataResult<GenerationReport> {
        let features = select(self.discover()?, request)?;
        info!(
            features = features.len(),
            apis = features.iter().map(FeatureConfig::api_count).sum::<usize>(),
            "Generating"
        );

        let report = self.generate_features(&features).await;

        if request.format {
            let written = report.written();
            if !written.is_empty() {
                self.formatter.format(&written);
            }
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed().len(),
            "Generation finished"
        );
        Ok(report)
    }

    /// Generate features in batches. Features inside a batch run
    /// concurrently; batches run one after another.
    pub async fn generate_features(&self, features: &[FeatureConfig]) -> GenerationReport {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let size = batch_size(features.len(), parallelism);
        debug!(batch_size = size, "Batching features");

        let mut report = GenerationReport::default();
        for batch in features.chunks(size) {
            let results = join_all(batch.iter().map(|f| self.generate_feature(f))).await;
            for feature in results {
                report.extend(feature);
            }
        }
        report
    }

    /// Generate every page of a feature. Pages run concurrently; they never
    /// share output files.
    #[instrument(skip_all, fields(feature = %feature.name))]
    pub async fn generate_feature(&self, feature: &FeatureConfig) -> FeatureReport {
        let pages = join_all(feature.pages.iter().map(|p| self.generate_page(p))).await;
        FeatureReport {
            feature: feature.name.clone(),
            units: pages.into_iter().flatten().collect(),
        }
    }

    /// Generate the APIs of one page, in file order.
    #[instrument(skip_all, fields(page = %page.name))]
    pub async fn generate_page(&self, page: &PageConfig) -> Vec<UnitReport> {
        let entries = match &page.entries {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "Page configuration unreadable");
                let mut unit = UnitReport::new(page, None);
                unit.outcome = UnitOutcome::Failed(err.clone().into());
                return vec![unit];
            }
        };

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        let mut cache = SampleCache::new();
        let mut units = Vec::with_capacity(entries.len());
        for (entry, clash) in entries.iter().zip(name_clashes(entries)) {
            let unit = match clash {
                Some(err) => {
                    warn!(api = %entry.name, error = %err, "Api name clash");
                    let mut unit = UnitReport::new(page, Some(&entry.name));
                    unit.outcome = UnitOutcome::Failed(err.into());
                    unit
                }
                None => self.generate_api(page, entry, &names, &mut cache).await,
            };
            units.push(unit);
        }
        units
    }

    #[instrument(skip_all, fields(api = %entry.name))]
    async fn generate_api(
        &self,
        page: &PageConfig,
        entry: &ApiEntry,
        siblings: &[&str],
        cache: &mut SampleCache,
    ) -> UnitReport {
        let mut unit = UnitReport::new(page, Some(&entry.name));
        if let Err(err) = self
            .try_generate_api(page, entry, siblings, cache, &mut unit)
            .await
        {
            match &err {
                StrataError::Domain(DomainError::SampleFormat { .. }) => {
                    warn!(error = %err, "Malformed sample")
                }
                _ => warn!(error = %err, "API generation failed"),
            }
            unit.outcome = UnitOutcome::Failed(err);
        } else {
            debug!(written = unit.written.len(), "API generated");
        }
        unit
    }

    async fn try_generate_api(
        &self,
        page: &PageConfig,
        entry: &ApiEntry,
        siblings: &[&str],
        cache: &mut SampleCache,
        unit: &mut UnitReport,
    ) -> StrataResult<()> {
        let api = entry.validate()?;
        let fs = self.filesystem.as_ref();

        let body = match &api.body_sample {
            Some(path) => {
                let path = page.resolve(path);
                let sample = cache.load(fs, &path).await?;
                Some(infer_document(&sample, &path)?)
            }
            None => None,
        };

        let response = match (&api.response_sample, api.return_data.is_model()) {
            (Some(path), true) => {
                let path = page.resolve(path);
                let sample = cache.load(fs, &path).await?;
                Some(infer_sample(&sample, &path)?)
            }
            _ => None,
        };

        let headers = self.load_headers(page, &api, cache).await?;

        let layout = page.layout();
        let input = ApiInput {
            api: &api,
            page: &page.name,
            layout: &layout,
            settings: &self.settings,
            body,
            response,
            headers,
        };
        let mut registry = ClassNameRegistry::new(&api.name).reserving(siblings.iter().copied());
        let artifacts = emit_api(&input, &mut registry);

        for file in &artifacts.files {
            self.write_generated(&file.path, file, unit).await?;
        }
        if let Some(extra) = &api.extra_output_dir {
            let root = page.resolve(extra);
            for file in &artifacts.files {
                self.write_generated(&root.join(&file.relative), file, unit)
                    .await?;
            }
        }

        let engine = PatchEngine::new(fs);
        for (path, fragments) in group_by_path(&artifacts.fragments) {
            let outcome = engine.patch(&path, &fragments).await?;
            if outcome.written {
                unit.written.push(outcome.path);
            }
            unit.warnings.extend(outcome.warnings);
        }
        for (path, key) in &artifacts.stale {
            let outcome = engine.remove(path, key).await?;
            if outcome.written {
                unit.written.push(outcome.path);
            }
        }
        Ok(())
    }

    async fn load_headers(
        &self,
        page: &PageConfig,
        api: &ApiDefinition,
        cache: &mut SampleCache,
    ) -> StrataResult<Vec<(String, String)>> {
        let Some(path) = &api.header_file else {
            return Ok(Vec::new());
        };
        let path = page.resolve(path);
        match cache.load(self.filesystem.as_ref(), &path).await? {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(name, value)| {
                    let value = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (name, value)
                })
                .collect()),
            _ => Err(DomainError::SampleFormat {
                path,
                reason: "header file must be a JSON object".into(),
            }
            .into()),
        }
    }

    async fn write_generated(
        &self,
        path: &Path,
        file: &GeneratedFile,
        unit: &mut UnitReport,
    ) -> StrataResult<()> {
        let current = self.filesystem.read_to_string(path).await?;
        if current.as_deref() == Some(file.content.as_str()) {
            return Ok(());
        }
        self.filesystem.write(path, &file.content).await?;
        unit.written.push(path.to_path_buf());
        Ok(())
    }
}

/// Fragments grouped by target file, in order of first appearance.
fn group_by_path(fragments: &[ArtifactFragment]) -> Vec<(PathBuf, Vec<&ArtifactFragment>)> {
    let mut groups: Vec<(PathBuf, Vec<&ArtifactFragment>)> = Vec::new();
    for fragment in fragments {
        match groups.iter().position(|(path, _)| *path == fragment.path) {
            Some(i) => groups[i].1.push(fragment),
            None => groups.push((fragment.path.clone(), vec![fragment])),
        }
    }
    groups
}

/// Apply the request's feature and page filters.
fn select(
    features: Vec<FeatureConfig>,
    request: &GenerationRequest,
) -> StrataResult<Vec<FeatureConfig>> {
    let mut selected = if request.features.is_empty() {
        features
    } else {
        let available: Vec<String> = features.iter().map(|f| f.name.clone()).collect();
        if let Some(missing) = request
            .features
            .iter()
            .find(|name| !available.contains(name))
        {
            return Err(ApplicationError::FeatureNotFound {
                name: missing.clone(),
                available,
            }
            .into());
        }
        features
            .into_iter()
            .filter(|f| request.features.contains(&f.name))
            .collect()
    };

    if let Some(page) = &request.page {
        for feature in &mut selected {
            feature.pages.retain(|p| &p.name == page);
        }
        selected.retain(|f| !f.pages.is_empty());
        if selected.is_empty() {
            return Err(ApplicationError::PageNotFound { name: page.clone() }.into());
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockFilesystem, MockFormatter, MockPageConfigLoader};
    use crate::domain::RawApiConfig;

    fn page(feature: &str, name: &str, entries: Result<Vec<ApiEntry>, DomainError>) -> PageConfig {
        PageConfig {
            feature: feature.into(),
            name: name.into(),
            dir: PathBuf::from(format!("/app/{feature}/{name}")),
            config_file: PathBuf::from(format!("/app/{feature}/{name}/json2dart/json2dart.yaml")),
            entries,
        }
    }

    fn feature(name: &str, pages: Vec<PageConfig>) -> FeatureConfig {
        FeatureConfig {
            name: name.into(),
            pages,
        }
    }

    fn service(
        loader: MockPageConfigLoader,
        fs: MockFilesystem,
        formatter: MockFormatter,
    ) -> GenerationService {
        GenerationService::new(
            Box::new(loader),
            Box::new(fs),
            Box::new(formatter),
            GeneratorSettings::default(),
        )
    }

    #[test]
    fn batch_size_is_half_rounded_up_and_bounded() {
        assert_eq!(batch_size(0, 8), 1);
        assert_eq!(batch_size(1, 8), 1);
        assert_eq!(batch_size(5, 8), 3);
        assert_eq!(batch_size(20, 4), 4);
        assert_eq!(batch_size(3, 0), 1);
    }

    #[test]
    fn select_filters_features_and_pages() {
        let features = vec![
            feature("auth", vec![page("auth", "login", Ok(vec![]))]),
            feature(
                "home",
                vec![page("home", "feed", Ok(vec![])), page("home", "login", Ok(vec![]))],
            ),
        ];

        let request = GenerationRequest {
            features: vec!["home".into()],
            ..GenerationRequest::default()
        };
        let selected = select(features.clone(), &request).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].pages.len(), 2);

        let request = GenerationRequest {
            page: Some("login".into()),
            ..GenerationRequest::default()
        };
        let selected = select(features.clone(), &request).unwrap();
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|f| f.pages.len() == 1));

        let request = GenerationRequest {
            features: vec!["settings".into()],
            ..GenerationRequest::default()
        };
        assert!(matches!(
            select(features, &request),
            Err(StrataError::Application(ApplicationError::FeatureNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn invalid_entries_fail_without_touching_files() {
        let entries = vec![
            ApiEntry::new("noMethod", RawApiConfig {
                path: Some("/x".into()),
                ..RawApiConfig::default()
            }),
            ApiEntry {
                name: "broken".into(),
                config: Err("expected a mapping".into()),
            },
        ];
        let features = vec![feature("auth", vec![page("auth", "login", Ok(entries))])];

        let mut loader = MockPageConfigLoader::new();
        loader.expect_discover().return_once(move || Ok(features));
        let mut fs = MockFilesystem::new();
        fs.expect_write().never();
        fs.expect_read_to_string().never();
        let mut formatter = MockFormatter::new();
        formatter.expect_format().never();

        let report = service(loader, fs, formatter)
            .generate(&GenerationRequest {
                format: true,
                ..GenerationRequest::default()
            })
            .await
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failed().len(), 2);
        assert!(matches!(
            report.units[0].error(),
            Some(StrataError::Domain(DomainError::MissingRequiredField { field: "method", .. }))
        ));
    }

    #[tokio::test]
    async fn unreadable_page_is_one_failed_unit() {
        let err = DomainError::InvalidPageConfig {
            path: PathBuf::from("/app/auth/login/json2dart/json2dart.yaml"),
            reason: "mapping values are not allowed here".into(),
        };
        let features = vec![feature("auth", vec![page("auth", "login", Err(err))])];

        let mut loader = MockPageConfigLoader::new();
        loader.expect_discover().return_once(move || Ok(features));

        let report = service(loader, MockFilesystem::new(), MockFormatter::new())
            .generate(&GenerationRequest::default())
            .await
            .unwrap();

        assert_eq!(report.units.len(), 1);
        assert_eq!(report.units[0].api, None);
        assert_eq!(report.units[0].label(), "auth/login");
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn sample_cache_reads_each_file_once() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string()
            .times(1)
            .returning(|_| Ok(Some("{\"id\": 1}".to_string())));

        let mut cache = SampleCache::new();
        let path = Path::new("/app/s.json");
        let first = cache.load(&fs, path).await.unwrap();
        let second = cache.load(&fs, path).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn missing_sample_is_a_sample_error() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string().returning(|_| Ok(None));

        let mut cache = SampleCache::new();
        let err = cache.load(&fs, Path::new("/missing.json")).await.unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Sample);
    }

    #[tokio::test]
    async fn unreadable_sample_is_a_cached_sample_error() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string().times(1).returning(|path| {
            Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "stream did not contain valid UTF-8".into(),
            }
            .into())
        });

        let mut cache = SampleCache::new();
        let path = Path::new("/app/binary.json");
        let err = cache.load(&fs, path).await.unwrap_err();
        assert!(matches!(
            &err,
            StrataError::Domain(DomainError::SampleFormat { reason, .. }) if reason.contains("UTF-8")
        ));
        assert_eq!(err.category(), crate::error::ErrorCategory::Sample);

        // second API sharing the sample sees the same error without a read
        assert_eq!(cache.load(&fs, path).await.unwrap_err(), err);
    }

    #[tokio::test]
    async fn clashing_api_names_fail_both_units() {
        let entry = |name: &str| {
            ApiEntry::new(
                name,
                RawApiConfig {
                    method: Some("get".into()),
                    path: Some("/a".into()),
                    return_data: Some("status_code".into()),
                    ..RawApiConfig::default()
                },
            )
        };
        let entries = vec![entry("loginUser"), entry("login_user")];
        let features = vec![feature("auth", vec![page("auth", "login", Ok(entries))])];

        let mut loader = MockPageConfigLoader::new();
        loader.expect_discover().return_once(move || Ok(features));
        let mut fs = MockFilesystem::new();
        fs.expect_write().never();

        let report = service(loader, fs, MockFormatter::new())
            .generate(&GenerationRequest::default())
            .await
            .unwrap();

        assert_eq!(report.failed().len(), 2);
        for unit in &report.units {
            assert!(matches!(
                unit.error(),
                Some(StrataError::Domain(DomainError::ApiNameClash { stem, .. })) if stem == "login_user"
            ));
        }
    }

    #[test]
    fn report_written_is_deduplicated() {
        let mut a = UnitReport::new(&page("f", "p", Ok(vec![])), Some("a"));
        a.written = vec![PathBuf::from("x"), PathBuf::from("y")];
        let mut b = UnitReport::new(&page("f", "p", Ok(vec![])), Some("b"));
        b.written = vec![PathBuf::from("y"), PathBuf::from("z")];
        let report = GenerationReport { units: vec![a, b] };
        assert_eq!(
            report.written(),
            vec![PathBuf::from("x"), PathBuf::from("y"), PathBuf::from("z")]
        );
        assert!(report.is_success());
    }
}
