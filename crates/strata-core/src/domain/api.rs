//! API definitions: raw page-configuration entries and their validated form.
//!
//! Raw entries mirror the YAML keys one-to-one and are all optional; the
//! validated [`ApiDefinition`] is what the generator consumes. Validation
//! happens per entry so one bad entry never blocks its siblings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::ident::{camel, pascal, snake};

static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("path param pattern is valid"));

// ── HttpMethod ────────────────────────────────────────────────────────────────

/// HTTP verb, plus the streaming (server-sent events) variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Multipart,
    GetSse,
    PostSse,
    PutSse,
    PatchSse,
    DeleteSse,
}

impl HttpMethod {
    pub const VALUES: &'static [&'static str] = &[
        "get",
        "post",
        "put",
        "patch",
        "delete",
        "multipart",
        "get_sse",
        "post_sse",
        "put_sse",
        "patch_sse",
        "delete_sse",
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Multipart => "multipart",
            Self::GetSse => "get_sse",
            Self::PostSse => "post_sse",
            Self::PutSse => "put_sse",
            Self::PatchSse => "patch_sse",
            Self::DeleteSse => "delete_sse",
        }
    }

    pub const fn is_streaming(&self) -> bool {
        matches!(
            self,
            Self::GetSse | Self::PostSse | Self::PutSse | Self::PatchSse | Self::DeleteSse
        )
    }

    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart)
    }

    /// Method name called on the generated HTTP client.
    pub fn client_call(&self) -> String {
        camel(self.as_str())
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "patch" => Ok(Self::Patch),
            "delete" => Ok(Self::Delete),
            "multipart" | "post_multipart" => Ok(Self::Multipart),
            "get_sse" | "getsse" => Ok(Self::GetSse),
            "post_sse" | "postsse" => Ok(Self::PostSse),
            "put_sse" | "putsse" => Ok(Self::PutSse),
            "patch_sse" | "patchsse" => Ok(Self::PatchSse),
            "delete_sse" | "deletesse" => Ok(Self::DeleteSse),
            _ => Err(()),
        }
    }
}

// ── CacheStrategy ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStrategy {
    ApiOnly,
    CacheOrApi,
    AsyncOrCache,
    CacheOnly,
}

impl CacheStrategy {
    pub const VALUES: &'static [&'static str] =
        &["api_only", "cache_or_api", "async_or_cache", "cache_only"];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ApiOnly => "api_only",
            Self::CacheOrApi => "cache_or_api",
            Self::AsyncOrCache => "async_or_cache",
            Self::CacheOnly => "cache_only",
        }
    }

    /// Dart expression passed to the client.
    pub fn dart(&self) -> String {
        format!("CacheStrategy.{}", camel(self.as_str()))
    }
}

impl FromStr for CacheStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "api_only" => Ok(Self::ApiOnly),
            "cache_or_api" => Ok(Self::CacheOrApi),
            "async_or_cache" => Ok(Self::AsyncOrCache),
            "cache_only" => Ok(Self::CacheOnly),
            _ => Err(()),
        }
    }
}

// ── ReturnData ────────────────────────────────────────────────────────────────

/// Shape of the data an API hands back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnData {
    #[default]
    Model,
    Header,
    BodyBytes,
    BodyString,
    StatusCode,
    Raw,
}

impl ReturnData {
    pub const VALUES: &'static [&'static str] = &[
        "model",
        "header",
        "body_bytes",
        "body_string",
        "status_code",
        "raw",
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Header => "header",
            Self::BodyBytes => "body_bytes",
            Self::BodyString => "body_string",
            Self::StatusCode => "status_code",
            Self::Raw => "raw",
        }
    }

    pub const fn is_model(&self) -> bool {
        matches!(self, Self::Model)
    }
}

impl FromStr for ReturnData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "model" => Ok(Self::Model),
            "header" | "headers" => Ok(Self::Header),
            "body_bytes" => Ok(Self::BodyBytes),
            "body_string" => Ok(Self::BodyString),
            "status_code" => Ok(Self::StatusCode),
            "raw" => Ok(Self::Raw),
            _ => Err(()),
        }
    }
}

// ── PathTemplate ──────────────────────────────────────────────────────────────

/// URL path with `{param}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    params: Vec<String>,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Self {
        let mut params = Vec::new();
        for cap in PATH_PARAM.captures_iter(raw) {
            let name = cap[1].to_string();
            if !params.contains(&name) {
                params.push(name);
            }
        }
        Self {
            raw: raw.to_string(),
            params,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of first appearance.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Dart string interpolation body with each `{param}` replaced by
    /// `${<receiver>.<camelParam>}`.
    pub fn interpolate(&self, receiver: &str) -> String {
        let mut out = String::new();
        let mut last = 0;
        for cap in PATH_PARAM.captures_iter(&self.raw) {
            let whole = cap.get(0).map(|m| m.range()).unwrap_or(0..0);
            out.push_str(&escape_literal(&self.raw[last..whole.start]));
            out.push_str(&format!("${{{receiver}.{}}}", camel(&cap[1])));
            last = whole.end;
        }
        out.push_str(&escape_literal(&self.raw[last..]));
        out
    }
}

fn escape_literal(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('$', "\\$")
}

// ── Raw configuration entry ───────────────────────────────────────────────────

/// One API entry exactly as written in a page's `json2dart.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawApiConfig {
    pub method: Option<String>,
    pub path: Option<String>,
    pub body: Option<String>,
    pub response: Option<String>,
    pub header: Option<String>,
    pub cache_strategy: Option<String>,
    pub return_data: Option<String>,
    pub base_url: Option<String>,
    pub extra_output_dir: Option<String>,
}

/// Named entry of a page configuration. `config` is `Err` when the YAML
/// value could not be read as an entry at all.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEntry {
    pub name: String,
    pub config: Result<RawApiConfig, String>,
}

impl ApiEntry {
    pub fn new(name: impl Into<String>, config: RawApiConfig) -> Self {
        Self {
            name: name.into(),
            config: Ok(config),
        }
    }

    /// Validate the entry into an [`ApiDefinition`].
    pub fn validate(&self) -> Result<ApiDefinition, DomainError> {
        let raw = self.config.as_ref().map_err(|reason| DomainError::InvalidApi {
            api: self.name.clone(),
            reason: reason.clone(),
        })?;
        ApiDefinition::from_raw(&self.name, raw)
    }
}

// ── Validated definition ──────────────────────────────────────────────────────

/// A validated API definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiDefinition {
    pub name: String,
    pub method: HttpMethod,
    pub path: PathTemplate,
    pub body_sample: Option<PathBuf>,
    pub response_sample: Option<PathBuf>,
    pub header_file: Option<PathBuf>,
    pub cache_strategy: Option<CacheStrategy>,
    pub return_data: ReturnData,
    pub base_url: Option<String>,
    pub extra_output_dir: Option<PathBuf>,
}

impl ApiDefinition {
    pub fn from_raw(name: &str, raw: &RawApiConfig) -> Result<Self, DomainError> {
        if name.trim().is_empty() || !name.chars().any(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidApi {
                api: name.to_string(),
                reason: "api name must contain at least one letter".into(),
            });
        }

        let method_raw = non_empty(&raw.method).ok_or_else(|| DomainError::MissingRequiredField {
            api: name.to_string(),
            field: "method",
        })?;
        let method = method_raw
            .parse::<HttpMethod>()
            .map_err(|_| DomainError::InvalidApiValue {
                api: name.to_string(),
                field: "method",
                value: method_raw.to_string(),
                expected: HttpMethod::VALUES,
            })?;

        let path_raw = non_empty(&raw.path).ok_or_else(|| DomainError::MissingRequiredField {
            api: name.to_string(),
            field: "path",
        })?;

        let cache_strategy = non_empty(&raw.cache_strategy)
            .map(|value| {
                value
                    .parse::<CacheStrategy>()
                    .map_err(|_| DomainError::InvalidApiValue {
                        api: name.to_string(),
                        field: "cache_strategy",
                        value: value.to_string(),
                        expected: CacheStrategy::VALUES,
                    })
            })
            .transpose()?;

        let return_data = non_empty(&raw.return_data)
            .map(|value| {
                value
                    .parse::<ReturnData>()
                    .map_err(|_| DomainError::InvalidApiValue {
                        api: name.to_string(),
                        field: "return_data",
                        value: value.to_string(),
                        expected: ReturnData::VALUES,
                    })
            })
            .transpose()?
            .unwrap_or_default();

        if method.is_streaming()
            && !matches!(return_data, ReturnData::Model | ReturnData::BodyString)
        {
            return Err(DomainError::InvalidApi {
                api: name.to_string(),
                reason: format!(
                    "streaming method '{}' only supports return_data 'model' or 'body_string', got '{}'",
                    method,
                    return_data.as_str()
                ),
            });
        }

        Ok(Self {
            name: name.to_string(),
            method,
            path: PathTemplate::parse(path_raw),
            body_sample: non_empty(&raw.body).map(PathBuf::from),
            response_sample: non_empty(&raw.response).map(PathBuf::from),
            header_file: non_empty(&raw.header).map(PathBuf::from),
            cache_strategy,
            return_data,
            base_url: non_empty(&raw.base_url).map(str::to_string),
            extra_output_dir: non_empty(&raw.extra_output_dir).map(PathBuf::from),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ── Page-level checks ─────────────────────────────────────────────────────────

/// For each entry, the sibling whose name generates the same file and class
/// stems, as a [`DomainError::ApiNameClash`].
pub fn name_clashes(entries: &[ApiEntry]) -> Vec<Option<DomainError>> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            entries
                .iter()
                .enumerate()
                .find(|(j, other)| *j != i && same_stem(&entry.name, &other.name))
                .map(|(_, other)| DomainError::ApiNameClash {
                    api: entry.name.clone(),
                    other: other.name.clone(),
                    stem: snake(&entry.name),
                })
        })
        .collect()
}

fn same_stem(a: &str, b: &str) -> bool {
    snake(a) == snake(b) || pascal(a) == pascal(b)
}
