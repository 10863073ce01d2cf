//! CLI commands implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use docsift::config::EnrichmentConfig;
use docsift::extract::{check_tools, ExtractorRegistry};
use docsift::llm::{EnrichmentClient, OllamaBackend};
use docsift::models::{ProcessingOutcome, RawDocument};
use docsift::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "docsift")]
#[command(about = "Document text extraction and AI enrichment pipeline")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Process a document and print the enriched outcome as JSON
    Process {
        /// Path to the document
        path: PathBuf,
        /// Declared type token (pdf, doc, docx, jpg, jpeg, png); inferred
        /// from the file extension when omitted
        #[arg(short = 't', long = "type")]
        declared_type: Option<String>,
        /// Enrichment backend endpoint
        #[arg(long, env = "DOCSIFT_ENDPOINT")]
        endpoint: Option<String>,
        /// Model used for enrichment
        #[arg(long, env = "DOCSIFT_MODEL")]
        model: Option<String>,
        /// Pretty-print the JSON outcome
        #[arg(long)]
        pretty: bool,
    },

    /// Check availability of the external extraction tools and the
    /// enrichment backend
    Check {
        /// Enrichment backend endpoint
        #[arg(long, env = "DOCSIFT_ENDPOINT")]
        endpoint: Option<String>,
    },
}

/// Parse arguments and dispatch.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            path,
            declared_type,
            endpoint,
            model,
            pretty,
        } => process(path, declared_type, endpoint, model, pretty).await,
        Commands::Check { endpoint } => check(endpoint).await,
    }
}

async fn process(
    path: PathBuf,
    declared_type: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
    pretty: bool,
) -> anyhow::Result<()> {
    let token = declared_type
        .or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_string())
        })
        .context("no declared type and the path has no extension")?;

    let bytes = std::fs::read(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let doc = RawDocument::new(bytes, token);

    let mut config = EnrichmentConfig::default();
    if let Some(endpoint) = endpoint {
        config = config.with_endpoint(&endpoint);
    }
    if let Some(model) = model {
        config = config.with_model(&model);
    }

    let backend = OllamaBackend::new(&config)?;
    let client = EnrichmentClient::new(config, Arc::new(backend));
    let pipeline = Pipeline::new(ExtractorRegistry::new(), client);

    // Fatal errors still produce a structured outcome record on stdout,
    // but exit non-zero.
    let (outcome, fatal) = match pipeline.process(&doc).await {
        Ok(outcome) => (outcome, false),
        Err(e) => (ProcessingOutcome::failed(e.to_stage_error()), true),
    };

    let json = if pretty {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string(&outcome)?
    };
    println!("{}", json);

    if fatal {
        std::process::exit(1);
    }
    Ok(())
}

async fn check(endpoint: Option<String>) -> anyhow::Result<()> {
    for (tool, available) in check_tools() {
        println!("{}: {}", tool, if available { "found" } else { "missing" });
    }

    let mut config = EnrichmentConfig::default();
    if let Some(endpoint) = endpoint {
        config = config.with_endpoint(&endpoint);
    }
    let backend = OllamaBackend::new(&config)?;
    let reachable = backend.is_available().await;
    println!(
        "backend {}: {}",
        config.endpoint,
        if reachable { "reachable" } else { "unreachable" }
    );
    Ok(())
}
