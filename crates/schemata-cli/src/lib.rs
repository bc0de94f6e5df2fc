//! Schemata CLI library
//!
//! This module contains the core CLI logic: it replays a TOML scenario
//! against a fresh workspace and writes a plain-text report.

pub mod error_adapter;
pub mod scenario;

mod args;
mod config;
mod report;

pub use args::Args;

use std::fs;

use log::info;

use schemata::SchemataError;

use scenario::{Runner, Scenario};

/// Run the Schemata CLI application
///
/// This function replays the scenario file and writes the resulting report
/// to the output file.
///
/// # Errors
///
/// Returns `SchemataError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Scenario parsing errors and unknown handles
/// - Engine errors other than a cancelled confirmation
pub fn run(args: &Args) -> Result<(), SchemataError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Running scenario"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let scenario = Scenario::parse(&source)?;

    let mut runner = Runner::new(app_config, &scenario.answers);
    runner.run(&scenario)?;
    let status = runner.take_status();
    let report = report::render(runner.workspace(), &status);

    fs::write(&args.output, report)?;

    info!(output_file = args.output, cancelled = runner.cancelled(); "Report written");

    Ok(())
}
