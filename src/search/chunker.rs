use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};

/// Splits text into overlapping windows of whitespace-delimited words.
///
/// The window advances by `max(1, window_size - overlap_size)` words, so an
/// overlap at or above the window size degrades to a step of one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    window_size: usize,
    step: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            window_size: 256,
            step: 128,
        }
    }
}

impl Chunker {
    pub fn new(window_size: usize, overlap_size: i64) -> Result<Self> {
        if window_size == 0 {
            return Err(RagError::invalid("window size must be at least 1"));
        }
        if overlap_size < 0 {
            return Err(RagError::invalid(format!(
                "overlap must be a non-negative integer, got {overlap_size}"
            )));
        }

        let overlap = usize::try_from(overlap_size).unwrap_or(usize::MAX);
        Ok(Self {
            window_size,
            step: window_size.saturating_sub(overlap).max(1),
        })
    }

    /// Overlap expressed as a fraction of the window (0.0 = none, 1.0 = maximal)
    pub fn with_overlap_ratio(window_size: usize, ratio: f64) -> Result<Self> {
        if window_size == 0 {
            return Err(RagError::invalid("window size must be at least 1"));
        }
        if !(0.0..=1.0).contains(&ratio) {
            return Err(RagError::invalid(format!(
                "overlap ratio must be between 0 and 1, got {ratio}"
            )));
        }

        let step = (window_size as f64 * (1.0 - ratio)).floor() as usize;
        Ok(Self {
            window_size,
            step: step.max(1),
        })
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();

        (0..words.len())
            .step_by(self.step)
            .map(|start| {
                let end = (start + self.window_size).min(words.len());
                words[start..end].join(" ")
            })
            .collect()
    }
}

/// One-shot form of [`Chunker::new`] followed by [`Chunker::chunk`].
pub fn chunk_text(text: &str, window_size: usize, overlap_size: i64) -> Result<Vec<String>> {
    Ok(Chunker::new(window_size, overlap_size)?.chunk(text))
}

/// Write each chunk to `<out_dir>/<stem>_<NNNNN>.txt`, numbered from 1.
pub fn save_chunks(chunks: &[String], source: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chunk".to_string());

    let mut written = Vec::with_capacity(chunks.len());
    for (idx, chunk) in chunks.iter().enumerate() {
        let path = out_dir.join(format!("{}_{:05}.txt", stem, idx + 1));
        fs::write(&path, chunk)?;
        written.push(path);
    }

    Ok(written)
}
