use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reposift")]
#[command(about = "Chunk, embed, and search source repositories", version)]
pub(crate) struct Cli {
    /// Configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch a GitHub repository into a snapshot file
    Fetch {
        /// `owner/repo` or a GitHub URL
        #[arg(value_name = "REPO")]
        repo: String,

        #[arg(short, long, default_value = "repo_contents.json")]
        output: PathBuf,
    },
    /// Capture a local directory as a snapshot file
    Snapshot {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        #[arg(short, long, default_value = "repo_contents.json")]
        output: PathBuf,

        /// Repository name recorded in the snapshot (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the chunks of a snapshot as JSON lines
    Chunk {
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,
    },
    /// Chunk and embed a snapshot into the vector index
    Index {
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,

        #[arg(long, value_name = "DIR")]
        index_dir: Option<PathBuf>,
    },
    /// Retrieve the chunks most similar to a query
    Search {
        query: String,

        /// Number of results (defaults to `index.top_k`)
        #[arg(short)]
        k: Option<usize>,

        #[arg(long, value_name = "DIR")]
        index_dir: Option<PathBuf>,
    },
}
