//! `strata generate` - run the generation pipeline.

use strata_adapters::{DartFormatter, LocalFilesystem, YamlPageLoader};
use strata_core::application::{GenerationReport, GenerationRequest, GenerationService};
use tracing::{info, instrument};

use crate::{
    cli::{GenerateArgs, GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Generate every selected API and report per-unit results.
#[instrument(skip_all)]
pub async fn execute(
    args: GenerateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let request = build_request(&args, &config);
    info!(features_dir = %config.features_dir.display(), "Starting generation");

    let service = GenerationService::new(
        Box::new(YamlPageLoader::new(&config.features_dir)),
        Box::new(LocalFilesystem::new()),
        Box::new(DartFormatter::new()),
        config.generator.clone(),
    );

    let spinner = output.spinner("Generating...");
    let result = service.generate(&request).await;
    spinner.finish_and_clear();

    let report = result?;
    print_report(&report, &global, &output)?;
    check(&report)
}

fn build_request(args: &GenerateArgs, config: &AppConfig) -> GenerationRequest {
    GenerationRequest {
        features: args.features.clone(),
        page: args.page.clone(),
        format: args.format || config.format_after_generate,
    }
}

fn print_report(
    report: &GenerationReport,
    global: &GlobalArgs,
    output: &OutputManager,
) -> CliResult<()> {
    for unit in &report.units {
        match unit.error() {
            None => output.success(&unit.label())?,
            Some(err) => output.error(&format!("{}: {err}", unit.label()))?,
        }
        for warning in &unit.warnings {
            output.warning(&format!("{}: {warning}", unit.label()))?;
        }
        if global.verbose > 0 {
            for path in &unit.written {
                output.print(&format!("    {}", path.display()))?;
            }
        }
    }

    let written = report.written().len();
    output.info(&format!(
        "{} of {} units generated, {written} files written",
        report.succeeded(),
        report.units.len(),
    ))?;
    Ok(())
}

fn check(report: &GenerationReport) -> CliResult<()> {
    if report.is_success() {
        return Ok(());
    }
    Err(CliError::GenerationFailed {
        failed: report.failed().iter().map(|unit| unit.label()).collect(),
        total: report.units.len(),
    })
}
