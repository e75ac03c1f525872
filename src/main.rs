//! Command-line entry point.
//!
//! # Run sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] (defaults on first run), apply CLI overrides.
//! 3. Build the extraction and translation services from config.
//! 4. Read every FILE and ingest them concurrently.
//! 5. Wait for all extractions, print one status line per document.
//! 6. Export the translations of completed documents.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use doc_translate::{
    config::AppConfig,
    export::{export_translation, ExportFormat},
    pipeline::{IngestPolicy, Orchestrator, OrchestratorSettings},
    services::{ApiExtractor, ApiTranslator, ChatClient, PromptBuilder, Translator},
    store::{new_shared_store, DocumentStatus},
};

#[derive(Parser)]
#[command(name = "doc-translate")]
#[command(about = "Extract and translate text from scanned documents")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for exported translations
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Export format (overrides the settings file)
    #[arg(long, value_enum)]
    format: Option<ExportFormat>,

    /// Images or PDFs to process
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // 2. Configuration
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };
    if let Some(dir) = cli.export_dir {
        config.export.output_dir = Some(dir);
    }
    if let Some(format) = cli.format {
        config.export.format = format;
    }
    if config.service.resolved_api_key().is_none() {
        log::warn!(
            "No API key configured; set {} if the service requires one",
            doc_translate::config::settings::API_KEY_ENV
        );
    }

    // 3. Services (the extractor's follow-up translation shares the translator)
    let translator: Arc<dyn Translator> = Arc::new(ApiTranslator::from_config(&config.service));
    let extractor = ApiExtractor::new(
        ChatClient::from_config(&config.service),
        PromptBuilder::new(&config.service.source_languages, &config.service.target_language),
        Arc::clone(&translator),
    )
    .with_translation_timeout(config.service.timeout());

    let store = new_shared_store();
    let orchestrator = Orchestrator::new(
        Arc::clone(&store),
        Arc::new(extractor),
        translator,
        OrchestratorSettings::from_config(&config),
    );

    // 4. Ingest (unreadable or rejected files are reported and skipped)
    let policy = IngestPolicy::from_config(&config.ingest);
    let mut rejected = 0usize;
    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        match policy.load(path).await {
            Ok(file) => files.push(file),
            Err(e) => {
                rejected += 1;
                eprintln!("rejected: {e}");
            }
        }
    }

    let mut ingestions = Vec::new();
    for result in orchestrator.ingest_batch(files) {
        match result {
            Ok(ingestion) => ingestions.push(ingestion),
            Err(e) => {
                rejected += 1;
                eprintln!("rejected: {e}");
            }
        }
    }

    // 5. Wait
    for ingestion in ingestions {
        ingestion.finished().await;
    }

    // 6. Report and export
    let output_dir = config.export.resolved_output_dir();
    let mut failed = 0usize;
    for doc in store.documents() {
        match &doc.status {
            DocumentStatus::Completed => {
                println!("{}  completed  {}", doc.id, doc.file_name);
                match export_translation(&doc, config.export.format, &output_dir) {
                    Ok(path) => println!("    → {}", path.display()),
                    Err(e) => println!("    not exported: {e}"),
                }
            }
            DocumentStatus::Error(message) => {
                failed += 1;
                println!("{}  error      {}: {message}", doc.id, doc.file_name);
            }
            other => println!("{}  {:<10} {}", doc.id, other.label(), doc.file_name),
        }
    }

    if failed + rejected > 0 {
        anyhow::bail!("{failed} document(s) failed, {rejected} file(s) rejected");
    }
    Ok(())
}
