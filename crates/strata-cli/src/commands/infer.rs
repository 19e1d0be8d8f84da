//! `strata infer` - print the classes one sample would produce.

use std::path::Path;

use strata_core::{
    domain::{DomainError, SampleDocument, SampleValue, infer_sample, preview},
    error::StrataError,
};
use tracing::debug;

use crate::{
    cli::InferArgs,
    config::AppConfig,
    error::{CliResult, IntoCli},
    output::OutputManager,
};

pub fn execute(args: InferArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let content = std::fs::read_to_string(&args.sample)
        .with_cli_context(|| format!("Failed to read sample '{}'", args.sample.display()))?;

    let document = parse_sample(&content, &args.sample).map_err(StrataError::from)?;
    debug!(
        fields = document.shape.len(),
        many = document.many,
        "Sample inferred"
    );

    let source = preview(
        &document.shape,
        document.many,
        &args.name,
        args.artifact.into(),
        &config.generator,
    );
    output.data(source.trim_end())?;
    Ok(())
}

fn parse_sample(content: &str, path: &Path) -> Result<SampleDocument, DomainError> {
    let value: SampleValue =
        serde_json::from_str(content).map_err(|e| DomainError::SampleFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    infer_sample(&value, path)
}
