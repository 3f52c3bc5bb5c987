use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use finrag_core::bootstrap::resolve_config_path;
use finrag_core::vault::EnvVaultProvider;
use finrag_core::{AppContext, IngestReport, RetrievedChunk};
use finrag_memory::document::UploadedFile;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Ask questions about your financial documents.
#[derive(Parser, Debug)]
#[command(name = "finrag", version, about)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read, chunk and index PDF, CSV or TXT files.
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Answer a question from the indexed documents.
    Ask { question: String },
    /// Show the chunks nearest to a query.
    Search {
        query: String,
        /// Number of chunks to return. Defaults to the configured `top_k`.
        #[arg(short)]
        k: Option<usize>,
    },
    /// Count indexed chunks and files.
    Stats,
    /// Remove every indexed chunk.
    Clear,
}

fn init_subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    let ctx = AppContext::build(&config_path, &EnvVaultProvider)
        .await
        .with_context(|| format!("failed to start with config {}", config_path.display()))?;
    let engine = &ctx.engine;

    match cli.command {
        Command::Ingest { files } => {
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                match UploadedFile::from_path(path).await {
                    Ok(file) => uploads.push(file),
                    Err(e) => tracing::warn!(path = %path.display(), "skipping file: {e}"),
                }
            }
            let report = engine.ingest(&uploads).await?;
            print_report(&report);
        }
        Command::Ask { question } => {
            let answer = engine.answer(&question).await?;
            println!("{}", answer.text);
            if !answer.sources.is_empty() {
                println!();
                println!("Sources:");
                print_sources(&answer.sources);
            }
        }
        Command::Search { query, k } => {
            let k = k.unwrap_or(engine.settings().top_k);
            let hits = engine.search(&query, k).await?;
            if hits.is_empty() {
                println!("No documents indexed.");
            }
            print_sources(&hits);
        }
        Command::Stats => {
            let stats = engine.stats().await?;
            println!("Chunks: {}", stats.total_chunks);
            println!("Files: {}", stats.unique_files);
            let types: Vec<&str> = stats.file_types.iter().map(String::as_str).collect();
            println!("File types: {}", types.join(", "));
        }
        Command::Clear => {
            engine.clear().await?;
            println!("Index cleared.");
        }
    }

    Ok(())
}

fn print_report(report: &IngestReport) {
    for file in &report.files {
        match &file.outcome {
            Ok(chunks) => println!("{}: {chunks} chunks", file.filename),
            Err(e) => println!("{}: failed: {e}", file.filename),
        }
    }
    println!("Added {} chunks.", report.chunks_added);
}

fn print_sources(hits: &[RetrievedChunk]) {
    for (i, hit) in hits.iter().enumerate() {
        let preview: String = hit.text.chars().take(200).collect();
        println!(
            "{}. {} (chunk {}, similarity {:.3})",
            i + 1,
            hit.metadata.filename,
            hit.metadata.chunk_id,
            hit.similarity
        );
        println!("   {preview}");
    }
}
