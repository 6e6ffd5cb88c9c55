//! Word-window chunking, a content-addressed vector store with brute-force
//! cosine ranking, and single-file snapshot persistence, plus the
//! orchestration that wires them to external embedding and generation
//! services.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod search;

pub use error::{RagError, Result};
