//! Apimatic - command-line tool for generating API documentation.
//!
//! Scans a Flask, FastAPI, Django or Express project and writes a Markdown report or
//! an OpenAPI document describing its endpoints.
//!
//! # Usage
//!
//! ```bash
//! apimatic [OPTIONS] [PROJECT_PATH]
//! ```
//!
//! # Examples
//!
//! Generate `API_Docs.md` in the project:
//! ```bash
//! apimatic ./my-api-project
//! ```
//!
//! Generate an OpenAPI document, enriched by a local model:
//! ```bash
//! apimatic ./my-api-project -f openapi --enrich ollama-cli -o openapi.yaml
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! apimatic ./my-api-project -v
//! ```

use anyhow::Result;
use apimatic::cli;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    // Parse first so the verbose flag can pick the log level
    let parsed = cli::CliArgs::parse();

    let log_level = if parsed.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Apimatic starting...");

    let args = cli::parse_args_from_parsed(parsed)?;

    cli::run(args)?;

    info!("Documentation generation completed successfully");

    Ok(())
}
