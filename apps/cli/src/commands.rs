//! Subcommand implementations.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use slicedrop_download::{
    DownloadCoordinator, DownloadError, DownloadEvent, DownloadOutcome, DownloadSession,
    RangeSource, RemoteFile, SessionRegistry,
};
use slicedrop_http::HttpStore;
use slicedrop_transfer::{Chunker, format_size, validate_file_name};
use slicedrop_upload::{UploadCoordinator, UploadEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::ClientConfig;

fn connect(config: &ClientConfig) -> anyhow::Result<HttpStore> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    HttpStore::new(&config.server_url, Some(timeout))
        .with_context(|| format!("creating client for {}", config.server_url))
}

/// Prints `<content id>  <chunks>  <size>  <path>` per file. With `levels`,
/// every Merkle level follows, root last.
pub async fn hash(config: &ClientConfig, files: &[PathBuf], levels: bool) -> anyhow::Result<()> {
    let chunker = Chunker::from_config(&config.transfer)?;
    for path in files {
        let chunked = chunker
            .chunk_file(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let tree = chunked.merkle_tree();
        println!(
            "{}  {:>5}  {:>10}  {}",
            tree.content_id(),
            tree.leaf_count(),
            format_size(chunked.size),
            path.display()
        );
        if levels {
            for (depth, level) in tree.levels().iter().enumerate() {
                for node in level {
                    println!("  L{depth}  {node}");
                }
            }
        }
    }
    Ok(())
}

pub async fn upload(
    config: &ClientConfig,
    files: &[PathBuf],
    content_type: Option<&str>,
) -> anyhow::Result<()> {
    let store = connect(config)?;
    let mut coordinator = UploadCoordinator::new(&store, config.transfer.clone())?;
    let printer = coordinator.take_events().map(|mut events| {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    UploadEvent::Progress { file, percent, .. } => {
                        eprintln!("{file}: {percent}%");
                    }
                    UploadEvent::StatusChanged { file, status } => {
                        eprintln!("{file}: {status}");
                    }
                    UploadEvent::ChunkFailed {
                        file, index, error, ..
                    } => {
                        eprintln!("{file}: chunk {index} failed: {error}");
                    }
                }
            }
        })
    });

    let mut tasks = Vec::with_capacity(files.len());
    let mut failed = 0;
    for path in files {
        match coordinator.prepare_file(path, content_type).await {
            Ok(task) => tasks.push(task),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot prepare file");
                failed += 1;
            }
        }
    }

    let results = coordinator.upload_all(&mut tasks).await;
    drop(coordinator);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    for result in &results {
        match (&result.report, &result.error) {
            (Some(report), _) if report.deduplicated => {
                println!("{}  {}  (already stored)", report.content_id, result.file);
            }
            (Some(report), _) => {
                println!(
                    "{}  {}  ({} chunk(s) sent, {} resumed)",
                    report.content_id, result.file, report.transferred_chunks, report.resumed_chunks
                );
            }
            (None, error) => {
                println!(
                    "FAILED  {}  {}",
                    result.file,
                    error.as_deref().unwrap_or("unknown error")
                );
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} file(s) failed", files.len());
    }
    Ok(())
}

pub async fn list(config: &ClientConfig) -> anyhow::Result<()> {
    let store = connect(config)?;
    let files = store.list_files().await?;

    if files.is_empty() {
        println!("no files stored");
        return Ok(());
    }
    for file in files {
        let content_id = file
            .content_id
            .map(|id| id.to_hex())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:>6}  {:>10}  {}  {}",
            file.id,
            format_size(file.size),
            content_id,
            file.name
        );
    }
    Ok(())
}

/// Where a downloaded file is written. The stored name must not escape
/// `download_dir`.
pub fn output_path(
    config: &ClientConfig,
    file: &RemoteFile,
    output: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    if let Some(output) = output {
        return Ok(output);
    }
    validate_file_name(&file.name)
        .with_context(|| format!("refusing to write stored name {:?}", file.name))?;
    Ok(config.download_dir.join(&file.name))
}

pub async fn download(
    config: &ClientConfig,
    id: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let store = connect(config)?;
    let file = store
        .list_files()
        .await?
        .into_iter()
        .find(|f| f.id == id)
        .with_context(|| format!("no stored file with id {id}"))?;
    let path = output_path(config, &file, output)?;

    let registry = Arc::new(SessionRegistry::new());
    let session = registry.session(&file, config.transfer.chunk_size)?;
    let mut session = session.lock().await;

    let mut coordinator = DownloadCoordinator::new(&store);
    let printer = coordinator.take_events().map(|mut events| {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let DownloadEvent::Progress {
                    percent,
                    received,
                    total,
                    bytes_per_second,
                    ..
                } = event
                {
                    eprintln!(
                        "{percent:>3}%  {} / {}  {}/s",
                        format_size(received),
                        format_size(total),
                        format_size(bytes_per_second as u64)
                    );
                }
            }
        })
    });

    let pauser = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                let paused = registry.pause_all();
                if paused > 0 {
                    info!(paused, "pause requested");
                }
            }
        })
    };
    let total = session.total_chunks();
    let result = drive(&coordinator, &mut session, |interruption| async move {
        eprintln!("{interruption} of {total} chunk(s); press Enter to resume, Ctrl-D to give up");
        wait_for_enter().await
    })
    .await;
    pauser.abort();
    let blob = result?;

    write_file(&path, &blob).await?;
    println!("{}  {}", format_size(blob.len() as u64), path.display());

    drop(coordinator);
    if let Some(printer) = printer {
        let _ = printer.await;
    }
    Ok(())
}

/// Why a download stopped before the last chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interruption {
    Paused { buffered: usize },
    Failed {
        chunk: u32,
        buffered: usize,
        message: String,
    },
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interruption::Paused { buffered } => write!(f, "paused after {buffered}"),
            Interruption::Failed {
                chunk,
                buffered,
                message,
            } => write!(f, "chunk {chunk} failed ({message}), kept {buffered}"),
        }
    }
}

/// Runs `session` to completion. After a pause or a failed chunk, `resume`
/// decides whether to continue from the buffered chunks; the session keeps
/// its buffer either way.
pub async fn drive<F, Fut>(
    coordinator: &DownloadCoordinator<'_>,
    session: &mut DownloadSession,
    mut resume: F,
) -> anyhow::Result<Vec<u8>>
where
    F: FnMut(Interruption) -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    loop {
        let interruption = match coordinator.download(session).await {
            Ok(DownloadOutcome::Completed(blob)) => return Ok(blob),
            Ok(DownloadOutcome::Paused { buffered }) => Interruption::Paused { buffered },
            Err(DownloadError::Retrieval { chunk, message }) => {
                warn!(
                    file_id = %session.file().id,
                    chunk,
                    buffered = session.buffered_chunks(),
                    "chunk retrieval failed"
                );
                Interruption::Failed {
                    chunk,
                    buffered: session.buffered_chunks(),
                    message,
                }
            }
            Err(e) => return Err(e.into()),
        };
        if !resume(interruption).await? {
            bail!("download of {} abandoned", session.file().name);
        }
    }
}

/// `false` on end of input.
async fn wait_for_enter() -> anyhow::Result<bool> {
    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(read > 0)
}

async fn write_file(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
