use crate::enrich::ollama_cli::OllamaCliEnricher;
use crate::enrich::ollama_http::OllamaHttpBackend;
use crate::enrich::{Enricher, NoopEnricher, PerEndpointEnricher};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Apimatic - Generate API documentation (Markdown or OpenAPI) from web framework source code
#[derive(Parser, Debug)]
#[command(name = "apimatic")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the project source root
    #[arg(value_name = "PROJECT_PATH", default_value = ".")]
    pub project_path: PathBuf,

    /// Web framework(s) to document (if not specified, auto-detect)
    #[arg(short = 'w', long = "framework", value_enum)]
    pub frameworks: Vec<Framework>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "markdown")]
    pub output_format: OutputFormat,

    /// Output file path ("-" for stdout; defaults to API_Docs.md or openapi.yaml/json in the project)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enrich endpoints with a language model
    #[arg(long = "enrich", value_enum, default_value = "none")]
    pub enrich: EnrichMode,

    /// Model name used for enrichment
    #[arg(long = "model", env = "APIMATIC_MODEL", default_value = "llama3:instruct")]
    pub model: String,

    /// Base URL of the Ollama HTTP service
    #[arg(long = "ollama-host", env = "OLLAMA_HOST", default_value = "http://localhost:11434")]
    pub ollama_host: String,

    /// Timeout in seconds for a single enrichment request
    #[arg(long = "request-timeout", value_name = "SECS", default_value_t = 120)]
    pub request_timeout: u64,

    /// Time budget in seconds for the whole enrichment stage
    #[arg(long = "enrich-timeout", value_name = "SECS")]
    pub enrich_timeout: Option<u64>,

    /// Number of enrichment requests in flight at once (HTTP backend)
    #[arg(short = 'j', long = "jobs", default_value_t = 1)]
    pub jobs: usize,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown report
    Markdown,
    /// OpenAPI document in YAML
    Openapi,
    /// OpenAPI document in JSON
    #[value(name = "openapi-json")]
    OpenapiJson,
}

impl OutputFormat {
    /// File name used when no output path is given
    pub fn default_file_name(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "API_Docs.md",
            OutputFormat::Openapi => "openapi.yaml",
            OutputFormat::OpenapiJson => "openapi.json",
        }
    }
}

/// Enrichment backends
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum EnrichMode {
    /// No enrichment
    None,
    /// Local `ollama run` subprocess, one batch for all endpoints
    #[value(name = "ollama-cli")]
    OllamaCli,
    /// Ollama HTTP API, one request per endpoint
    #[value(name = "ollama-http")]
    OllamaHttp,
}

/// Supported web frameworks
#[derive(
    Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    /// Django (urls.py + views.py)
    Django,
    /// Express (JavaScript / TypeScript)
    Express,
    /// FastAPI
    Fastapi,
    /// Flask
    Flask,
}

impl Framework {
    /// All registered frameworks, in identifier order
    pub fn all() -> &'static [Framework] {
        &[
            Framework::Django,
            Framework::Express,
            Framework::Fastapi,
            Framework::Flask,
        ]
    }

    /// Short identifier, as used on the command line and in tags
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Django => "django",
            Framework::Express => "express",
            Framework::Fastapi => "fastapi",
            Framework::Flask => "flask",
        }
    }

    /// Human-readable name used for document headings
    pub fn display_name(&self) -> &'static str {
        match self {
            Framework::Django => "Django",
            Framework::Express => "Express",
            Framework::Fastapi => "FastAPI",
            Framework::Flask => "Flask",
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if args.jobs == 0 {
        anyhow::bail!("--jobs must be at least 1");
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    match args.output_path {
        Some(ref output) if output.as_os_str() == "-" => info!("Output: stdout"),
        Some(ref output) => info!("Output file: {}", output.display()),
        None => info!("Output: default file in project root"),
    }
    if args.frameworks.is_empty() {
        info!("Framework: auto-detect");
    } else {
        info!("Framework: {:?}", args.frameworks);
    }
    if args.enrich != EnrichMode::None {
        info!("Enrichment: {:?} (model {})", args.enrich, args.model);
    }

    Ok(args)
}

/// Builds the enrichment stage selected on the command line.
pub fn build_enricher(args: &CliArgs) -> Result<Box<dyn Enricher>> {
    let stage_timeout = args.enrich_timeout.map(Duration::from_secs);

    let enricher: Box<dyn Enricher> = match args.enrich {
        EnrichMode::None => Box::new(NoopEnricher),
        EnrichMode::OllamaCli => {
            let mut enricher = OllamaCliEnricher::new(&args.model);
            if let Some(timeout) = stage_timeout {
                enricher = enricher.with_timeout(timeout);
            }
            Box::new(enricher)
        }
        EnrichMode::OllamaHttp => {
            let backend = OllamaHttpBackend::new(
                &args.ollama_host,
                &args.model,
                Duration::from_secs(args.request_timeout),
            )?;
            let mut enricher = PerEndpointEnricher::new(backend).with_concurrency(args.jobs);
            if let Some(timeout) = stage_timeout {
                enricher = enricher.with_deadline(timeout);
            }
            Box::new(enricher)
        }
    };

    Ok(enricher)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::pipeline::{collect_endpoints, project_title, render, validate_root, RunOutcome};
    use crate::serializer::write_to_file;

    info!("Starting API documentation generation...");

    // Step 1: Validate the project root (the only fatal condition)
    let root = validate_root(&args.project_path)?;

    // Step 2: Select frameworks and extract endpoints
    let selected = (!args.frameworks.is_empty()).then_some(args.frameworks.as_slice());
    let collection = collect_endpoints(&root, selected);

    match collection.outcome() {
        RunOutcome::NoFrameworkDetected => warn!(
            "No supported web framework detected. Force one with --framework <{}>",
            Framework::all()
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join("|")
        ),
        RunOutcome::NoEndpointsFound => warn!("No endpoints found"),
        RunOutcome::Documented(count) => info!("Documenting {} endpoints", count),
    }

    // Step 3: Optional enrichment
    let mut endpoints = collection.endpoints;
    if !endpoints.is_empty() {
        let enricher = build_enricher(&args)?;
        info!("Enriching endpoints with {}", enricher.name());
        let enriched = enricher.enrich(endpoints);
        enriched.report.log_summary();
        endpoints = enriched.endpoints;
    }

    // Step 4: Render the document
    let title = project_title(&root);
    let content = render(&endpoints, args.output_format, &title)?;

    // Step 5: Output to file or stdout
    let output_path = args
        .output_path
        .clone()
        .unwrap_or_else(|| root.join(args.output_format.default_file_name()));
    if output_path.as_os_str() == "-" {
        println!("{}", content);
    } else {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, &output_path)?;
        info!("Successfully wrote documentation to {}", output_path.display());
    }

    // Step 6: Display summary
    info!("Generation complete!");
    info!("Summary:");
    info!("  - Frameworks: {:?}", collection.frameworks);
    info!("  - Endpoints documented: {}", endpoints.len());
    info!("  - Files skipped: {}", collection.skipped_files);
    info!("  - Unresolved handlers: {}", collection.unresolved_handlers);

    Ok(())
}
