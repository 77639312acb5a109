//! `grvault`: manage a device-backed file catalog from the terminal.
//!
//! Uploads are copied into the configured upload directory and tracked in a JSON record list with
//! GR serial numbers. The same catalog is what the desktop build of the files app reads.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod cli;
pub mod commands;
pub mod error;

use std::io;

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use crate::cli::Command;
pub use crate::commands::{resolve_config_path, CommandContext};
pub use crate::error::{CliError, CliErrorCategory, CliResult};

/// Parses process arguments and runs the selected command.
pub fn execute_from_env() -> CliResult<()> {
    let invocation = cli::parse(std::env::args().skip(1).collect())?;
    if invocation.command == Command::Help {
        cli::print_usage();
        return Ok(());
    }

    let ctx = CommandContext::load(&invocation.options)?;
    init_logging(log_level(invocation.options.verbose, &ctx.config().log_level));
    log::debug!("using {} storage", ctx.config().storage.backend.as_str());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    ctx.run(invocation.command, &mut out)
}

/// Effective log level: `--verbose` forces debug, otherwise the configured level.
pub fn log_level(verbose: bool, configured: &str) -> LevelFilter {
    if verbose {
        return LevelFilter::Debug;
    }
    configured.parse().unwrap_or(LevelFilter::Info)
}

fn init_logging(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Debug)
        .build();
    // A second init (tests, embedding) keeps the first logger.
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

/// Converts a command result into a process exit code.
pub fn exit_code(result: CliResult<()>) -> std::process::ExitCode {
    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("{} failure", err.category.as_str());
            eprintln!("error: {err}");
            std::process::ExitCode::from(1)
        }
    }
}
