use anyhow::Result;
use clap::Parser;

use ragstore::cli::{self, Args, Command, IndexOptions};
use ragstore::config::Config;
use ragstore::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if args.verbose {
        config
            .logging
            .modules
            .insert("ragstore".to_string(), "debug".to_string());
    }
    logging::init_with_config(&config.logging);

    if let Some(store) = args.store {
        config.store.path = store;
    }

    match args.command {
        Command::Chunk {
            file,
            window,
            overlap,
            overlap_ratio,
            out_dir,
        } => cli::run_chunk(
            &file,
            window,
            overlap,
            overlap_ratio,
            &out_dir,
            &config.chunking,
        ),
        Command::Index {
            files,
            window,
            overlap,
            rebuild,
            check,
        } => {
            let options = IndexOptions {
                window,
                overlap,
                rebuild,
                check,
            };
            cli::run_index(&files, options, &config).await
        }
        Command::Query { text, top_k, json } => cli::run_query(&text, top_k, json, &config).await,
        Command::Ask {
            question,
            top_k,
            json,
        } => cli::run_ask(&question, top_k, json, &config).await,
        Command::Status => cli::run_status(&config),
    }
}
