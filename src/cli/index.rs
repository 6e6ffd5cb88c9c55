use anyhow::{Context, Result};
use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ChunkingConfig, Config};
use crate::error::RagError;
use crate::search::{create_embedder, Embedder, FileStore, IndexResult, Indexer, VectorStore};

static INDEXING: Emoji<'_, '_> = Emoji("📊 ", "");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "");
static ERROR: Emoji<'_, '_> = Emoji("❌ ", "");
static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "");

pub struct IndexOptions {
    pub window: Option<usize>,
    pub overlap: Option<i64>,
    pub rebuild: bool,
    pub check: bool,
}

/// Open the store at `path`; a corrupt snapshot is fatal unless `rebuild`.
fn open_store(path: &Path, rebuild: bool) -> Result<FileStore> {
    let store = FileStore::new(path.to_path_buf());
    match store.load() {
        Ok(true) => tracing::debug!(records = store.len(), "existing store loaded"),
        Ok(false) => tracing::debug!("starting a new store"),
        Err(RagError::CorruptState(reason)) if rebuild => {
            tracing::warn!(%reason, "snapshot unreadable, rebuilding from scratch");
        }
        Err(RagError::CorruptState(reason)) => {
            anyhow::bail!(
                "Store at {} is corrupt ({}). Re-run with --rebuild to start over.",
                path.display(),
                reason
            );
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load store {}", path.display()))
        }
    }
    Ok(store)
}

pub async fn run_index(files: &[PathBuf], options: IndexOptions, config: &Config) -> Result<()> {
    let chunking = ChunkingConfig {
        window_size: options.window.unwrap_or(config.chunking.window_size),
        overlap_size: options.overlap.unwrap_or(config.chunking.overlap_size),
    };
    let chunker = chunking.chunker()?;

    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedder)?);
    if options.check {
        println!(
            "{}Checking embedding service for model {}...",
            INFO,
            style(embedder.model()).cyan()
        );
        embedder.health_check().await?;
    }

    let store_path = &config.store.path;
    let store: Arc<dyn VectorStore> = Arc::new(open_store(store_path, options.rebuild)?);
    let indexer = Indexer::new(Arc::clone(&store), embedder, chunker);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?,
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let mut total = IndexResult::default();
    let mut errors = Vec::new();

    for file in files {
        pb.set_message(format!("{}{}", INDEXING, file.display()));
        match indexer.index_file(file).await {
            Ok(result) => {
                total.chunks += result.chunks;
                total.added += result.added;
                total.duplicates += result.duplicates;
            }
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "indexing failed");
                errors.push(format!("{}: {}", file.display(), e));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    store
        .persist()
        .with_context(|| format!("Failed to save store {}", store_path.display()))?;

    println!("\n{}Indexing complete!\n", SUCCESS);
    println!("  Chunks seen:     {}", style(total.chunks).cyan());
    println!("  Records added:   {}", style(total.added).green());
    println!("  Duplicates:      {}", style(total.duplicates).dim());

    if !errors.is_empty() {
        println!("\n{}Errors ({}):", ERROR, errors.len());
        for error in errors.iter().take(10) {
            println!("  - {}", style(error).red());
        }
        if errors.len() > 10 {
            println!("  ... and {} more", errors.len() - 10);
        }
    }

    print_stats(store.as_ref(), store_path)?;

    if errors.len() == files.len() {
        anyhow::bail!("No files could be indexed");
    }
    Ok(())
}

pub fn run_status(config: &Config) -> Result<()> {
    let store_path = &config.store.path;

    if !store_path.exists() {
        println!("{}No store found at {}", INFO, store_path.display());
        println!("Run `ragstore index <file>` to build one.");
        return Ok(());
    }

    let store = FileStore::open(store_path.clone())
        .with_context(|| format!("Failed to load store {}", store_path.display()))?;
    print_stats(&store, store_path)
}

fn print_stats(store: &dyn VectorStore, path: &Path) -> Result<()> {
    let stats = store.stats()?;

    println!("\n{}Store: {}\n", INFO, path.display());
    println!("  Records:         {}", style(stats.records).green());
    match stats.dimensions {
        Some(dims) => println!("  Dimensions:      {}", style(dims).cyan()),
        None => println!("  Dimensions:      {}", style("-").dim()),
    }
    println!(
        "  Snapshot size:   {} KB",
        style(stats.snapshot_bytes / 1024).yellow()
    );
    if let Some(saved) = stats.last_saved {
        println!(
            "  Last saved:      {}",
            style(saved.format("%Y-%m-%d %H:%M:%S")).dim()
        );
    }

    Ok(())
}
