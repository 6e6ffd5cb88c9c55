//! `ragstore.toml` configuration.
//!
//! Lookup order: `--config PATH`, then `./ragstore.toml`, then
//! `<config dir>/ragstore/config.toml`. A missing file means defaults.
//! Environment variables are applied last:
//!
//! | variable          | field                 |
//! |-------------------|-----------------------|
//! | `LLM_MODEL`       | `generator.model`     |
//! | `API_KEY`         | `generator.api_key`   |
//! | `OPENAI_API_KEY`  | `generator.api_key` (if `API_KEY` unset) |
//! | `LLM_ENDPOINT`    | `generator.endpoint`  |
//! | `OLLAMA_HOST`     | `embedder.endpoint`   |
//! | `EMBED_MODEL`     | `embedder.model`      |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::search::{Chunker, EmbedderConfig, GeneratorConfig};

pub const CONFIG_FILE_NAME: &str = "ragstore.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub embedder: EmbedderConfig,
    pub generator: GeneratorConfig,
    pub search: SearchConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub window_size: usize,
    pub overlap_size: i64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size: 256,
            overlap_size: 128,
        }
    }
}

impl ChunkingConfig {
    pub fn chunker(&self) -> crate::Result<Chunker> {
        Chunker::new(self.window_size, self.overlap_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".ragstore").join("snapshot.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for everything not listed in `modules`.
    pub default: String,
    /// Per-target overrides, e.g. `ragstore::search = "debug"`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: "warn".to_string(),
            modules: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::locate(explicit) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("ragstore").join("config.toml"))
            .filter(|path| path.exists())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(model) = non_empty("LLM_MODEL") {
            self.generator.model = model;
        }
        if let Some(key) = non_empty("API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
            self.generator.api_key = key;
        }
        if let Some(endpoint) = non_empty("LLM_ENDPOINT") {
            self.generator.endpoint = endpoint;
        }
        if let Some(host) = non_empty("OLLAMA_HOST") {
            self.embedder.endpoint = Some(host);
        }
        if let Some(model) = non_empty("EMBED_MODEL") {
            self.embedder.model = model;
        }
    }
}
