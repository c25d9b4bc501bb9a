//! slicedrop command-line client.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::ClientConfig;

#[derive(Debug, Parser)]
#[command(name = "slicedrop", version, about = "Chunked, deduplicating, resumable file transfer")]
struct Cli {
    /// Config file (default: ~/.config/slicedrop/client.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Store base URL.
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    /// Chunk size in bytes.
    #[arg(long, global = true, value_name = "BYTES")]
    chunk_size: Option<u64>,

    /// Chunk transfers in flight per file.
    #[arg(long, global = true, value_name = "N")]
    concurrency: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the content identifier of local files.
    Hash {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also print every Merkle tree level.
        #[arg(long)]
        levels: bool,
    },
    /// Upload files, skipping content the store already has.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Content type sent with every file (default: application/octet-stream).
        #[arg(long)]
        content_type: Option<String>,
    },
    /// List files stored on the server.
    List,
    /// Download a stored file by id. Ctrl-C pauses.
    Download {
        id: String,

        /// Output path (default: download_dir/<original name>).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    fn apply_overrides(&self, config: &mut ClientConfig) {
        if let Some(server) = &self.server {
            config.server_url = server.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            config.transfer.chunk_size = chunk_size;
        }
        if let Some(concurrency) = self.concurrency {
            config.transfer.upload_concurrency = concurrency;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,slicedrop=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    cli.apply_overrides(&mut config);
    config.transfer.validate()?;

    match cli.command {
        Command::Hash { files, levels } => commands::hash(&config, &files, levels).await,
        Command::Upload {
            files,
            content_type,
        } => commands::upload(&config, &files, content_type.as_deref()).await,
        Command::List => commands::list(&config).await,
        Command::Download { id, output } => commands::download(&config, &id, output).await,
    }
}
