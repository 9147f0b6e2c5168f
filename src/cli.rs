use crate::adapters::{adapter_for, AdapterKind};
use crate::parser::AstParser;
use crate::scanner::FileScanner;
use crate::schema_builder::{SchemaBuilder, SwaggerDocument};
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::settings::Config;
use crate::source::SourceIndex;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Configuration file looked up in the project root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "swagger.yaml";

/// Swagger From Docs - Generate a Swagger 2.0 document from the doc comments of a Rust project
#[derive(Parser, Debug)]
#[command(name = "swagger-from-docs")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Adapter describing how endpoints map to handlers
    #[arg(short = 'a', long = "adapter", value_enum, default_value = "simple")]
    pub adapter: AdapterKind,

    /// YAML configuration file (defaults to PROJECT_PATH/swagger.yaml when present)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }
    if let Some(config) = &args.config_path {
        if !config.is_file() {
            anyhow::bail!("Configuration file does not exist: {}", config.display());
        }
    }

    info!("Project path: {}", args.project_path.display());
    info!("Adapter: {:?}", args.adapter);
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// The explicit configuration, else the project's default file, else empty settings.
pub fn load_config(args: &CliArgs) -> Result<Config> {
    let path = match &args.config_path {
        Some(path) => path.clone(),
        None => {
            let default = args.project_path.join(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                warn!(
                    "No configuration given and {} not found, using defaults",
                    default.display()
                );
                return Ok(Config::default());
            }
            default
        }
    };

    info!("Loading configuration from {}", path.display());
    Config::load(&path).with_context(|| format!("Failed to load configuration: {}", path.display()))
}

/// Scans, indexes and documents the project.
pub fn generate(args: &CliArgs) -> Result<SwaggerDocument> {
    let config = load_config(args)?;

    info!("Scanning project directory...");
    let scan_result = FileScanner::new(args.project_path.clone())
        .scan()
        .context("Failed to scan project directory")?;
    info!("Found {} Rust files", scan_result.rust_files.len());
    if scan_result.rust_files.is_empty() {
        anyhow::bail!("No Rust files found in the project directory");
    }

    info!("Parsing Rust files...");
    let outcome = AstParser::parse_files(&scan_result.rust_files);
    if outcome.files.is_empty() {
        anyhow::bail!("No files could be parsed successfully");
    }
    info!(
        "Parsed {} files ({} skipped)",
        outcome.files.len(),
        outcome.failures.len()
    );

    let index = SourceIndex::new(&outcome.files);

    let adapter = adapter_for(args.adapter, &config.plugin)?;
    info!("Running {} adapter...", adapter.name());
    let part = adapter
        .run(&index)
        .with_context(|| format!("The {} adapter failed", adapter.name()))?;
    info!(
        "Collected {} paths and {} data shape definitions",
        part.paths.len(),
        part.definitions.len()
    );

    let mut builder = SchemaBuilder::new(config.swagger);
    builder.extend(part);
    Ok(builder.build())
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let document = generate(&args)?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Json => serialize_json(&document),
        OutputFormat::Yaml => serialize_yaml(&document),
    }
    .context("Failed to serialize the swagger document")?;

    match &args.output_path {
        Some(output_path) => {
            write_to_file(&content, output_path)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            info!("Wrote swagger document to {}", output_path.display());
        }
        None => println!("{}", content),
    }

    info!("Summary:");
    info!("  - Paths: {}", document.paths.len());
    info!(
        "  - Operations: {}",
        document.paths.values().map(|operations| operations.len()).sum::<usize>()
    );
    info!("  - Definitions: {}", document.definitions.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(project: &TempDir, extra: &[&str]) -> CliArgs {
        let mut argv = vec!["swagger-from-docs", project.path().to_str().unwrap()];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let project = TempDir::new().unwrap();
        let args = args(&project, &[]);

        assert_eq!(args.adapter, AdapterKind::Simple);
        assert!(matches!(args.output_format, OutputFormat::Json));
        assert!(args.config_path.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_adapter_and_format_flags() {
        let project = TempDir::new().unwrap();
        let args = args(&project, &["-a", "rest", "--format", "yaml", "-v"]);

        assert_eq!(args.adapter, AdapterKind::Rest);
        assert!(matches!(args.output_format, OutputFormat::Yaml));
        assert!(args.verbose);
    }

    #[test]
    fn test_rejects_missing_project() {
        let project = TempDir::new().unwrap();
        let mut args = args(&project, &[]);
        args.project_path = project.path().join("missing");

        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_default_config_file() {
        let project = TempDir::new().unwrap();
        fs::write(
            project.path().join(DEFAULT_CONFIG_FILE),
            "swagger:\n  title: Shelf\nplugin:\n  endpoints: []\n",
        )
        .unwrap();

        let config = load_config(&args(&project, &[])).unwrap();

        assert_eq!(config.swagger.title(), "Shelf");
        assert!(config.plugin.contains_key("endpoints"));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let project = TempDir::new().unwrap();
        let config = load_config(&args(&project, &[])).unwrap();

        assert_eq!(config, Config::default());
    }
}
