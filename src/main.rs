mod cli;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use reposift_core::Config;
use reposift_core::bootstrap::{
    chunking_options, create_codec, create_embedder, create_fetcher, index_dir, load_config,
    resolve_config_path,
};
use reposift_index::indexer::Indexer;
use reposift_index::retriever::{Retriever, format_hits};
use reposift_repo::Snapshot;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config(&config_path)?;

    match cli.command {
        Command::Fetch { repo, output } => fetch(&config, &repo, &output).await,
        Command::Snapshot { dir, output, name } => snapshot(&config, &dir, &output, name).await,
        Command::Chunk { snapshot } => chunk(&config, &snapshot).await,
        Command::Index {
            snapshot,
            index_dir: dir,
        } => index(&config, &snapshot, dir).await,
        Command::Search {
            query,
            k,
            index_dir: dir,
        } => search(&config, &query, k, dir).await,
    }
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

async fn fetch(config: &Config, repo: &str, output: &Path) -> anyhow::Result<()> {
    let snapshot = create_fetcher(config)
        .fetch(repo)
        .await
        .with_context(|| format!("failed to fetch {repo}"))?;
    snapshot
        .save(output)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

async fn snapshot(
    config: &Config,
    dir: &Path,
    output: &Path,
    name: Option<String>,
) -> anyhow::Result<()> {
    let name = name
        .or_else(|| {
            dir.canonicalize()
                .ok()?
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "repo".into());
    let snapshot = reposift_repo::local::read_dir(dir, &name, &config.github.exclude)
        .with_context(|| format!("failed to read {}", dir.display()))?;
    snapshot
        .save(output)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

async fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    Snapshot::load(path)
        .await
        .with_context(|| format!("failed to load snapshot {}", path.display()))
}

async fn chunk(config: &Config, path: &Path) -> anyhow::Result<()> {
    let snapshot = load_snapshot(path).await?;
    let codec = create_codec(config)?;
    let chunks = reposift_index::preprocess(&snapshot, &codec, &chunking_options(config))?;

    let mut out = std::io::stdout().lock();
    for chunk in &chunks {
        serde_json::to_writer(&mut out, chunk)?;
        writeln!(out)?;
    }
    Ok(())
}

async fn index(config: &Config, path: &Path, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let snapshot = load_snapshot(path).await?;
    let codec = create_codec(config)?;
    let chunks = reposift_index::preprocess(&snapshot, &codec, &chunking_options(config))?;

    let embedder = create_embedder(config)?;
    let dir = index_dir(config, dir.as_deref());
    let report = Indexer::new(embedder, &dir).index(&chunks).await?;
    println!(
        "Indexed {} chunks ({} dimensions) into {} in {} ms",
        report.chunks_indexed,
        report.dimension,
        dir.display(),
        report.duration_ms
    );
    Ok(())
}

async fn search(
    config: &Config,
    query: &str,
    k: Option<usize>,
    dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let embedder = create_embedder(config)?;
    let dir = index_dir(config, dir.as_deref());
    let hits = Retriever::new(embedder, dir)
        .retrieve(query, k.unwrap_or(config.index.top_k))
        .await?;
    if hits.is_empty() {
        println!("No results.");
    } else {
        print!("{}", format_hits(&hits));
    }
    Ok(())
}
