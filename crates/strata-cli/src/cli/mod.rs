//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use strata_core::domain::ArtifactKind;

pub mod global;
pub use global::GlobalArgs;

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "strata",
    bin_name = "strata",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Layered Dart code from JSON samples",
    long_about = "Strata reads json2dart.yaml files next to your feature pages and \
                  generates body, response and entity models, mappers, data sources, \
                  repositories and use cases from sample JSON.",
    after_help = "EXAMPLES:\n\
        \x20 strata generate\n\
        \x20 strata generate --feature auth --page login\n\
        \x20 strata infer sample.json --artifact entity\n\
        \x20 strata completions bash > /usr/share/bash-completion/completions/strata",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate code for every configured API.
    #[command(
        visible_alias = "g",
        about = "Generate code from page configurations",
        after_help = "EXAMPLES:\n\
            \x20 strata generate\n\
            \x20 strata generate -f auth -f home\n\
            \x20 strata generate --feature auth --page login --format"
    )]
    Generate(GenerateArgs),

    /// Print the classes inferred from one sample.
    #[command(
        about = "Preview the classes inferred from a JSON sample",
        after_help = "EXAMPLES:\n\
            \x20 strata infer response.json\n\
            \x20 strata infer body.json --name login --artifact body"
    )]
    Infer(InferArgs),

    /// List discovered features, pages and APIs.
    #[command(
        visible_alias = "ls",
        about = "List discovered features, pages and apis",
        after_help = "EXAMPLES:\n\
            \x20 strata list\n\
            \x20 strata list --format json"
    )]
    List(ListArgs),

    /// Initialise a Strata configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 strata init           # ./strata.toml\n\
            \x20 strata init --global  # user configuration"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 strata completions bash > ~/.local/share/bash-completion/completions/strata\n\
            \x20 strata completions zsh  > ~/.zfunc/_strata\n\
            \x20 strata completions fish > ~/.config/fish/completions/strata.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the active configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 strata config get features_dir\n\
            \x20 strata config get generator.http_client\n\
            \x20 strata config list"
    )]
    Config(ConfigCommands),
}

// ── generate ──────────────────────────────────────────────────────────────────

/// Arguments for `strata generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Restrict generation to these features. Repeatable.
    #[arg(
        short = 'f',
        long = "feature",
        value_name = "NAME",
        help = "Only generate this feature (repeatable)"
    )]
    pub features: Vec<String>,

    /// Restrict generation to pages with this name.
    #[arg(
        short = 'p',
        long = "page",
        value_name = "NAME",
        help = "Only generate this page"
    )]
    pub page: Option<String>,

    /// Run `dart format` over written files.
    #[arg(long = "format", help = "Run dart format on written files")]
    pub format: bool,
}

// ── infer ─────────────────────────────────────────────────────────────────────

/// Arguments for `strata infer`.
#[derive(Debug, Args)]
pub struct InferArgs {
    /// Sample JSON file.
    #[arg(value_name = "SAMPLE", help = "Path to a JSON sample")]
    pub sample: PathBuf,

    /// Base name of the root class.
    #[arg(
        short = 'n',
        long = "name",
        value_name = "NAME",
        default_value = "model",
        help = "Root class base name"
    )]
    pub name: String,

    /// Class family to print.
    #[arg(
        short = 'a',
        long = "artifact",
        value_enum,
        default_value = "response",
        help = "Class family to print"
    )]
    pub artifact: ArtifactArg,
}

/// Class families `strata infer` can print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArtifactArg {
    Body,
    Response,
    Entity,
    Mapper,
}

impl From<ArtifactArg> for ArtifactKind {
    fn from(arg: ArtifactArg) -> Self {
        match arg {
            ArtifactArg::Body => ArtifactKind::Body,
            ArtifactArg::Response => ArtifactKind::Response,
            ArtifactArg::Entity => ArtifactKind::Entity,
            ArtifactArg::Mapper => ArtifactKind::Mapper,
        }
    }
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `strata list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable tree.
    Table,
    /// One `feature/page/api` per line.
    List,
    /// JSON array of features.
    Json,
    /// CSV rows.
    Csv,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `strata init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to the user configuration directory instead of `./strata.toml`.
    #[arg(long = "global", help = "Create global configuration")]
    pub global: bool,

    /// Overwrite an existing config file.
    #[arg(long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `strata completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `strata config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `generator.base_url`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the configuration files that are read, in order.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
