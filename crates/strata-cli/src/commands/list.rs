//! Implementation of the `strata list` command.

use serde::Serialize;
use strata_adapters::YamlPageLoader;
use strata_core::{application::ports::PageConfigLoader, domain::FeatureConfig};

use crate::{
    cli::{ListArgs, ListFormat},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// One configured API, flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct ApiRow {
    feature: String,
    page: String,
    api: String,
    method: String,
    path: String,
}

pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let loader = YamlPageLoader::new(&config.features_dir);
    let features = loader.discover()?;

    match args.format {
        ListFormat::Table => print_table(&features, &output)?,
        ListFormat::List => {
            for row in rows(&features) {
                output.data(&format!("{}/{}/{}", row.feature, row.page, row.api))?;
            }
        }
        ListFormat::Json => {
            // JSON goes to stdout even in quiet mode so it stays pipeable.
            let json = serde_json::to_string_pretty(&rows(&features)).map_err(|e| {
                CliError::InvalidInput {
                    message: format!("Failed to serialise listing: {e}"),
                    source: Some(Box::new(e)),
                }
            })?;
            output.data(&json)?;
        }
        ListFormat::Csv => {
            output.data("feature,page,api,method,path")?;
            for row in rows(&features) {
                output.data(&format!(
                    "{},{},{},{},{}",
                    row.feature, row.page, row.api, row.method, row.path
                ))?;
            }
        }
    }

    Ok(())
}

fn print_table(features: &[FeatureConfig], output: &OutputManager) -> CliResult<()> {
    if features.is_empty() {
        output.info("No pages with a json2dart/json2dart.yaml were found")?;
        return Ok(());
    }

    output.header("Configured APIs:")?;
    for feature in features {
        output.print(&format!("  {}", feature.name))?;
        for page in &feature.pages {
            match &page.entries {
                Ok(entries) => {
                    output.print(&format!("    {} ({} apis)", page.name, entries.len()))?;
                    for entry in entries {
                        let (method, path) = describe(entry.config.as_ref().ok());
                        output.print(&format!("      {:<24} {:<6} {}", entry.name, method, path))?;
                    }
                }
                Err(err) => output.warning(&format!("    {}: {err}", page.name))?,
            }
        }
    }
    Ok(())
}

fn rows(features: &[FeatureConfig]) -> Vec<ApiRow> {
    let mut rows = Vec::new();
    for feature in features {
        for page in &feature.pages {
            let Ok(entries) = &page.entries else { continue };
            for entry in entries {
                let (method, path) = describe(entry.config.as_ref().ok());
                rows.push(ApiRow {
                    feature: feature.name.clone(),
                    page: page.name.clone(),
                    api: entry.name.clone(),
                    method,
                    path,
                });
            }
        }
    }
    rows
}

fn describe(raw: Option<&strata_core::domain::RawApiConfig>) -> (String, String) {
    let method = raw
        .and_then(|r| r.method.as_deref())
        .map(str::to_uppercase)
        .unwrap_or_else(|| "?".into());
    let path = raw
        .and_then(|r| r.path.clone())
        .unwrap_or_default();
    (method, path)
}
