//! `strata config` - inspect configuration values.

use crate::{
    cli::ConfigCommands,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Keys understood by `strata config get`.
const KEYS: &[&str] = &[
    "features_dir",
    "format_after_generate",
    "generator.base_url",
    "generator.http_client",
    "generator.http_client_import",
    "generator.date_format_body",
    "generator.date_format_response",
    "output.no_color",
];

/// Dispatch to the correct config subcommand.
pub fn execute(
    cmd: ConfigCommands,
    config: AppConfig,
    config_file: Option<&std::path::PathBuf>,
    output: OutputManager,
) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = get_config_value(&config, &key)?;
            output.data(&value)?;
        }

        ConfigCommands::List => {
            output.header("Current Configuration:")?;
            let serialised =
                toml::to_string_pretty(&config).map_err(|e| CliError::ConfigError {
                    message: format!("Failed to serialise config: {e}"),
                    source: Some(Box::new(e)),
                })?;
            output.data(serialised.trim_end())?;
        }

        ConfigCommands::Path => {
            for path in AppConfig::sources(config_file) {
                let marker = if path.exists() { "" } else { "  (missing)" };
                output.data(&format!("{}{marker}", path.display()))?;
            }
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn get_config_value(config: &AppConfig, key: &str) -> CliResult<String> {
    let generator = &config.generator;
    match key {
        "features_dir" => Ok(config.features_dir.display().to_string()),
        "format_after_generate" => Ok(config.format_after_generate.to_string()),
        "generator.base_url" => Ok(generator.base_url.clone()),
        "generator.http_client" => Ok(generator.http_client.clone()),
        "generator.http_client_import" => {
            Ok(generator.http_client_import.clone().unwrap_or_default())
        }
        "generator.date_format_body" => Ok(generator.date_format_body.clone()),
        "generator.date_format_response" => Ok(generator.date_format_response.clone()),
        "output.no_color" => Ok(config.output.no_color.to_string()),
        _ => Err(CliError::ConfigError {
            message: format!("Unknown config key: '{key}' (known: {})", KEYS.join(", ")),
            source: None,
        }),
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
