//! Assessment ingestion CLI.

use clap::{ColorChoice, Parser};
use assess_cli::logging::{LogConfig, LogFormat, init_logging};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_ingest, run_promote, run_purge, run_resolve};
use crate::summary::{print_events, print_outcome, print_promotion, print_resolution};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let config = cli.config.as_deref();
    let exit_code = match &cli.command {
        Command::Ingest(args) => match run_ingest(args, config) {
            Ok(result) => {
                print_outcome(&result.outcome);
                print_events(&result.events);
                if result.outcome.is_committed() { 0 } else { 1 }
            }
            Err(error) => report(&error),
        },
        Command::Promote(args) => match run_promote(args, config) {
            Ok(result) => {
                print_promotion(&result.summary);
                print_events(&result.events);
                0
            }
            Err(error) => report(&error),
        },
        Command::Purge(args) => match run_purge(args, config) {
            Ok(purged) => {
                println!("Purged {purged} completed row(s).");
                0
            }
            Err(error) => report(&error),
        },
        Command::Resolve(args) => match run_resolve(args, config) {
            Ok(resolution) => {
                print_resolution(&args.pen, &resolution);
                if resolution.is_resolved() { 0 } else { 1 }
            }
            Err(error) => report(&error),
        },
    };
    std::process::exit(exit_code);
}

fn report(error: &anyhow::Error) -> i32 {
    eprintln!("error: {error:#}");
    1
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
