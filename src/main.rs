//! cs-ts-service - Command-line tool for generating TypeScript service clients.
//!
//! Reads type manifests exported from a web API project (controllers, their actions, and the
//! classes they exchange), optionally with the XML documentation files of the project, and
//! writes TypeScript modules: interfaces and enums for the classes, one client class per
//! controller, and a `createServices` factory.
//!
//! # Usage
//!
//! ```bash
//! cs-ts-service [OPTIONS] <INPUT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate modules from a metadata directory:
//! ```bash
//! cs-ts-service ./metadata -o ./src/services
//! ```
//!
//! Force the Web API convention and emit knockout classes:
//! ```bash
//! cs-ts-service ./metadata -a web-api --observable
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! cs-ts-service ./metadata -v
//! ```

use anyhow::Result;
use clap::Parser;
use cs_ts_service::cli;
use log::info;

fn main() -> Result<()> {
    // Parse once for the verbose flag, validate after the logger is up
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("cs-ts-service starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("TypeScript service generation completed successfully");

    Ok(())
}
