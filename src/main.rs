use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use search_batcher::{
    application::{
        batching::{BuilderProvider, DocumentBatchIterator, DocumentSource, SpooledBuilderProvider},
        dto::UploadSummary,
        errors::BatchingError,
        ports::{DocumentTransport, SpoolProvider},
        use_cases::{BulkUploadUseCase, DeleteDocumentsUseCase},
    },
    domain::entities::{Document, SerializedDocument},
    infrastructure::{
        audit::TracingOutcomeReporter,
        spool::AdaptiveSpoolProvider,
        transport::{CloudSearchClient, DryRunTransport},
    },
    Config,
};

#[derive(Parser)]
#[command(name = "search-batch-upload", version, about = "Pack documents into size-bounded batches and upload them")]
struct Cli {
    /// TOML config file; SEARCH_* environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Document endpoint, overrides SEARCH_DOCUMENT_ENDPOINT
    #[arg(long)]
    endpoint: Option<String>,

    /// Directory for spooled batch files
    #[arg(long)]
    spool_dir: Option<PathBuf>,

    /// Validate and count batches without sending them
    #[arg(long)]
    dry_run: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload documents read as newline-delimited JSON
    Upload {
        /// Input file; stdin when omitted
        #[arg(long, short)]
        input: Option<PathBuf>,
    },
    /// Delete documents by id, one id per line
    Delete {
        /// Id file; stdin when omitted
        #[arg(long)]
        ids: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path).map_err(anyhow::Error::msg)?,
        None => Config::default(),
    }
    .with_overrides(|key| std::env::var(key).ok());
    if let Some(endpoint) = cli.endpoint.clone() {
        config.document_endpoint = Some(endpoint);
    }
    if let Some(dir) = cli.spool_dir.clone() {
        config.spool_dir = Some(dir);
    }
    config.validate().map_err(anyhow::Error::msg)?;
    info!("Configuration loaded and validated");

    let limits = config.batch_limits()?;
    let spools = AdaptiveSpoolProvider::new(
        config.spool_strategy,
        limits.max_batch_size(),
        config.spool_memory_threshold,
        config.spool_dir.clone(),
    );
    spools.init().context("Failed to prepare spool directory")?;
    let spools: Arc<dyn SpoolProvider> = Arc::new(spools);
    let builders: Arc<dyn BuilderProvider> = Arc::new(SpooledBuilderProvider::new(limits, spools));

    let transport: Arc<dyn DocumentTransport> = if cli.dry_run {
        info!("Dry run: batches are validated locally and not sent");
        Arc::new(DryRunTransport::new())
    } else {
        match config.cloudsearch_config() {
            Some(transport_config) => Arc::new(CloudSearchClient::new(transport_config)?),
            None => bail!("No document endpoint configured; pass --endpoint or --dry-run"),
        }
    };

    let upload = BulkUploadUseCase::new(
        Arc::clone(&builders),
        transport,
        Arc::new(TracingOutcomeReporter::new()),
        config.upload_options(),
    );

    let summary = match cli.command {
        Command::Upload { input } => {
            let source = document_source(open_input(input.as_deref())?);
            upload
                .execute_batches(DocumentBatchIterator::new(source, builders))
                .await?
        }
        Command::Delete { ids } => {
            let ids = read_ids(open_input(ids.as_deref())?)?;
            DeleteDocumentsUseCase::new(upload).execute(ids).await?
        }
    };

    report(&summary)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn BufRead + Send>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(std::io::stdin()))),
    }
}

/// Lazily parse NDJSON documents; missing versions get the run's stamp and adds default to `en`
fn document_source(input: Box<dyn BufRead + Send>) -> DocumentSource {
    let version = Utc::now().timestamp();
    let documents = input
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
        .map(move |(index, line)| -> Result<SerializedDocument, BatchingError> {
            let line = line.map_err(|e| BatchingError::Source(format!("line {}: {}", index + 1, e)))?;
            let document: Document = serde_json::from_str(&line)
                .map_err(|e| BatchingError::Source(format!("line {}: {}", index + 1, e)))?;
            let document = document.with_missing_defaults(version);
            Ok(SerializedDocument::from_document(&document)?)
        });
    Box::new(documents)
}

fn read_ids(input: Box<dyn BufRead + Send>) -> anyhow::Result<Vec<String>> {
    let mut ids = Vec::new();
    for line in input.lines() {
        let line = line.context("Failed to read ids")?;
        let id = line.trim();
        if !id.is_empty() {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

fn report(summary: &UploadSummary) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);

    if summary.batches_failed > 0 {
        bail!(
            "{} of {} batches were not accepted",
            summary.batches_failed,
            summary.batches_failed + summary.batches_uploaded
        );
    }
    info!(
        batches = summary.batches_uploaded,
        documents = summary.documents_uploaded,
        skipped = summary.oversized_document_ids.len(),
        "Upload complete"
    );
    Ok(())
}
