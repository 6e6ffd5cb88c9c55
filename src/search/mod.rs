pub mod chunker;
pub mod embedder;
pub mod generator;
pub mod indexer;
pub mod loader;
pub mod ranker;
pub mod searcher;
pub mod store;

pub use chunker::{chunk_text, save_chunks, Chunker};
pub use embedder::{create_embedder, Embedder, EmbedderConfig};
pub use generator::{create_generator, GenerateOptions, Generator, GeneratorConfig};
pub use indexer::{IndexResult, Indexer};
pub use loader::load_text;
pub use ranker::cosine_similarity;
pub use searcher::{Answer, Searcher};
pub use store::{
    ContentStore, FileStore, Record, ScoredId, SearchHit, Snapshot, StoreStats, VectorStore,
};
