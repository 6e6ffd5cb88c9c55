use anyhow::{Context, Result};
use console::{style, Emoji};
use std::path::Path;

use crate::config::ChunkingConfig;
use crate::search::{load_text, save_chunks, Chunker};

static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "");

pub fn run_chunk(
    file: &Path,
    window: Option<usize>,
    overlap: Option<i64>,
    overlap_ratio: Option<f64>,
    out_dir: &Path,
    defaults: &ChunkingConfig,
) -> Result<()> {
    let chunking = ChunkingConfig {
        window_size: window.unwrap_or(defaults.window_size),
        overlap_size: overlap.unwrap_or(defaults.overlap_size),
    };
    let chunker = match overlap_ratio {
        Some(ratio) => Chunker::with_overlap_ratio(chunking.window_size, ratio)?,
        None => chunking.chunker()?,
    };

    let text = load_text(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let chunks = chunker.chunk(&text);
    let written = save_chunks(&chunks, file, out_dir)?;

    tracing::info!(
        file = %file.display(),
        chunks = chunks.len(),
        step = chunker.step(),
        "chunked file"
    );

    println!(
        "{}Saved {} chunks to {}",
        SUCCESS,
        style(written.len()).cyan(),
        style(out_dir.display()).green()
    );

    Ok(())
}
