//! Swagger From Docs - command-line tool generating Swagger 2.0 documents.
//!
//! The tool scans a Rust project, reads the YAML blocks embedded in doc comments of the
//! handlers, views and data shapes named in the configuration file, and prints (or writes)
//! the merged document.
//!
//! # Usage
//!
//! ```bash
//! swagger-from-docs [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Document the endpoints listed in `./my-service/swagger.yaml`:
//! ```bash
//! swagger-from-docs ./my-service
//! ```
//!
//! Use the resource adapter and write YAML:
//! ```bash
//! swagger-from-docs ./my-service -a rest -c api.yaml -f yaml -o swagger.yaml
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_from_docs::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Swagger From Docs starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Swagger document generation completed successfully");

    Ok(())
}
