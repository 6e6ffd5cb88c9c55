use anyhow::{Context, Result};
use console::{style, Emoji};
use std::sync::Arc;

use crate::config::Config;
use crate::search::{
    create_embedder, create_generator, Embedder, FileStore, Generator, SearchHit, Searcher,
    VectorStore,
};

static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "");
static DOC: Emoji<'_, '_> = Emoji("📄 ", "");
static ANSWER: Emoji<'_, '_> = Emoji("💬 ", "");

fn open_searcher(config: &Config) -> Result<Searcher> {
    let store_path = &config.store.path;
    if !store_path.exists() {
        anyhow::bail!("No store found. Run `ragstore index <file>` first to build one.");
    }

    let store: Arc<dyn VectorStore> = Arc::new(
        FileStore::open(store_path.clone())
            .with_context(|| format!("Failed to load store {}", store_path.display()))?,
    );
    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedder)?);

    Ok(Searcher::new(store, embedder))
}

pub async fn run_query(query: &str, top_k: Option<usize>, json: bool, config: &Config) -> Result<()> {
    let searcher = open_searcher(config)?;
    let results = searcher
        .search(query, top_k.unwrap_or(config.search.top_k))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results found for: {}", style(query).italic());
        return Ok(());
    }

    println!(
        "\n{}Found {} results for: {}\n",
        SEARCH,
        style(results.len()).cyan(),
        style(query).yellow().bold()
    );
    print_hits(&results);

    Ok(())
}

pub async fn run_ask(question: &str, top_k: Option<usize>, json: bool, config: &Config) -> Result<()> {
    let generator: Arc<dyn Generator> = Arc::from(create_generator(&config.generator)?);
    let searcher = open_searcher(config)?.with_generator(
        generator,
        config.generator.system_prompt.clone(),
        config.generator.options(),
    );

    let answer = searcher
        .answer(question, top_k.unwrap_or(config.search.top_k))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!("\n{}{}\n", ANSWER, answer.text);
    if !answer.sources.is_empty() {
        println!("{}", style("Sources:").bold());
        print_hits(&answer.sources);
    }

    Ok(())
}

fn print_hits(hits: &[SearchHit]) {
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{} {}. {} {}",
            DOC,
            style(i + 1).dim(),
            style(&hit.id).green(),
            style(format!("(score {:.4})", hit.score)).cyan()
        );

        let preview: String = hit.text.chars().take(200).collect();
        let truncated = if preview.len() < hit.text.len() {
            format!("{}...", preview)
        } else {
            preview
        };
        println!("   {}", style(truncated).dim());
        println!();
    }
}
