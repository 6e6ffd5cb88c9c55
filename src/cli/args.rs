use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ragstore", version, about = "Chunk, embed, store and query text for RAG")]
pub struct Args {
    /// Config file (default: ./ragstore.toml, then the user config dir)
    #[arg(long, global = true, env = "RAGSTORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Snapshot file, overriding [store].path
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split a text file into overlapping word windows and write them to disk
    Chunk {
        file: PathBuf,

        /// Words per chunk
        #[arg(short, long)]
        window: Option<usize>,

        /// Words shared between consecutive chunks
        #[arg(short, long, allow_negative_numbers = true, conflicts_with = "overlap_ratio")]
        overlap: Option<i64>,

        /// Overlap as a fraction of the window (0.0 - 1.0)
        #[arg(long)]
        overlap_ratio: Option<f64>,

        /// Output directory
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
    },

    /// Chunk, embed and store one or more text files
    Index {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long)]
        window: Option<usize>,

        #[arg(short, long, allow_negative_numbers = true)]
        overlap: Option<i64>,

        /// Start from an empty store if the snapshot is unreadable
        #[arg(long)]
        rebuild: bool,

        /// Check the embedding service before indexing
        #[arg(long)]
        check: bool,
    },

    /// Rank stored chunks against a query
    Query {
        text: String,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer a question from the stored chunks
    Ask {
        question: String,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Output the answer and its sources as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show store statistics
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_negative_overlap_parses() {
        let args = Args::parse_from(["ragstore", "chunk", "book.txt", "--overlap", "-1"]);
        match args.command {
            Command::Chunk { overlap, .. } => assert_eq!(overlap, Some(-1)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_overlap_and_ratio_conflict() {
        let result = Args::try_parse_from([
            "ragstore",
            "chunk",
            "book.txt",
            "--overlap",
            "2",
            "--overlap-ratio",
            "0.5",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_store_flag() {
        let args = Args::parse_from(["ragstore", "query", "llamas", "--store", "/tmp/s.json", "-k", "2"]);
        assert_eq!(args.store, Some(PathBuf::from("/tmp/s.json")));
        match args.command {
            Command::Query { top_k, .. } => assert_eq!(top_k, Some(2)),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
