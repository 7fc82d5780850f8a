//! CLI argument definitions for the assessment ingestion tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use assess_model::FileCategory;

#[derive(Parser)]
#[command(
    name = "assess",
    version,
    about = "Provincial assessment file ingestion",
    long_about = "Validate and load answer-key, scanner result and registration files.\n\n\
                  Result rows are staged and later promoted into student registrations."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include student identifiers (PENs, names) in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Pipeline settings file (TOML).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate one file and commit its accepted rows.
    Ingest(IngestArgs),

    /// Move staged result rows into student registrations.
    Promote(KeyArgs),

    /// Delete staged rows that were already promoted.
    Purge(KeyArgs),

    /// Follow a PEN through the merge graph.
    Resolve(ResolveArgs),
}

/// Store snapshot and reference data shared by every command.
#[derive(Args)]
pub struct StoreArgs {
    /// JSON snapshot of the store; created when missing.
    #[arg(long = "store", value_name = "PATH", default_value = "state.json")]
    pub store: PathBuf,

    /// Sessions, schools and students (JSON).
    #[arg(long = "reference", value_name = "PATH", default_value = "reference.json")]
    pub reference: PathBuf,
}

#[derive(Args)]
pub struct IngestArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Kind of file being submitted.
    #[arg(long = "kind", value_enum)]
    pub kind: KindArg,

    /// Session the file belongs to.
    #[arg(long = "session", value_name = "ID")]
    pub session: String,

    /// File to ingest. Its name must follow the file naming convention.
    #[arg(value_name = "FILE", required_unless_present = "payload")]
    pub file: Option<PathBuf>,

    /// Upload payload (JSON with fileName and base64Contents) instead of a file.
    #[arg(long = "payload", value_name = "PATH", conflicts_with = "file")]
    pub payload: Option<PathBuf>,
}

#[derive(Args)]
pub struct KeyArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long = "session", value_name = "ID")]
    pub session: String,

    /// Assessment type code, e.g. LTE10.
    #[arg(long = "assessment-type", value_name = "CODE")]
    pub assessment_type: String,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Reference data holding the student registry.
    #[arg(long = "reference", value_name = "PATH", default_value = "reference.json")]
    pub reference: PathBuf,

    #[arg(value_name = "PEN")]
    pub pen: String,
}

/// CLI file kinds.
#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Key,
    Result,
    Registration,
}

impl From<KindArg> for FileCategory {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Key => FileCategory::Key,
            KindArg::Result => FileCategory::Result,
            KindArg::Registration => FileCategory::Registration,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
