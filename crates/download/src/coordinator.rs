//! Download coordinator.
//!
//! Fetches a file's chunks sequentially by byte range, honoring pause
//! requests between chunks, and hands back the reassembled file once every
//! chunk is buffered.

use std::time::Duration;

use slicedrop_transfer::{ByteRange, SpeedCalculator, percent_ceil};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::DownloadError;
use crate::session::{DownloadSession, DownloadStatus};
use crate::source::RangeSource;

/// Progress event emitted during downloads.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    StatusChanged {
        file_id: String,
        status: DownloadStatus,
    },
    Progress {
        file_id: String,
        percent: u8,
        received: u64,
        total: u64,
        bytes_per_second: f64,
        eta: Option<Duration>,
    },
    Completed {
        file_id: String,
        size: u64,
    },
}

/// How a call to [`DownloadCoordinator::download`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Every chunk arrived; the concatenated file.
    Completed(Vec<u8>),
    /// Stopped by a pause request with `buffered` chunks kept.
    Paused { buffered: usize },
}

/// Drives [`DownloadSession`]s against a [`RangeSource`].
///
/// Sessions are independent: one coordinator may run several downloads
/// concurrently, each with its own session.
pub struct DownloadCoordinator<'a> {
    source: &'a dyn RangeSource,
    events_tx: mpsc::Sender<DownloadEvent>,
    events_rx: Option<mpsc::Receiver<DownloadEvent>>,
}

impl<'a> DownloadCoordinator<'a> {
    pub fn new(source: &'a dyn RangeSource) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            source,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<DownloadEvent>> {
        self.events_rx.take()
    }

    /// Downloads (or resumes) `session` from its first missing chunk.
    ///
    /// On a retrieval error the session is left in `error` with its buffer
    /// intact; calling again resumes at the failed chunk.
    pub async fn download(
        &self,
        session: &mut DownloadSession,
    ) -> Result<DownloadOutcome, DownloadError> {
        let file_id = session.file().id.clone();
        let size = session.file().size;
        let total = session.total_chunks();
        let offset = session.next_chunk_index();

        session.set_status(DownloadStatus::Downloading);
        self.emit_status(&file_id, DownloadStatus::Downloading);
        info!(
            file_id = %file_id,
            name = %session.file().name,
            size,
            offset,
            chunks = total,
            "download started"
        );

        let speed = SpeedCalculator::default();
        let mut received = session.buffered_bytes();

        for i in (offset + 1)..=total {
            if session.status() != DownloadStatus::Downloading {
                let buffered = session.buffered_chunks();
                info!(file_id = %file_id, buffered, "download paused");
                self.emit_status(&file_id, session.status());
                return Ok(DownloadOutcome::Paused { buffered });
            }

            let index = i - 1;
            let range = session.chunk_range(index);
            let data = match self.fetch(&file_id, index, range).await {
                Ok(data) => data,
                Err(e) => {
                    session.set_status(DownloadStatus::Error);
                    self.emit_status(&file_id, DownloadStatus::Error);
                    error!(
                        file_id = %file_id,
                        chunk = index,
                        buffered = session.buffered_chunks(),
                        error = %e,
                        "download failed"
                    );
                    return Err(e);
                }
            };

            received += data.len() as u64;
            speed.add_sample(data.len() as u64);
            let percent = percent_ceil(i as u64, total as u64);
            session.push_chunk(data, percent);

            debug!(file_id = %file_id, chunk = index, percent, "chunk received");
            self.emit(DownloadEvent::Progress {
                file_id: file_id.clone(),
                percent,
                received,
                total: size,
                bytes_per_second: speed.bytes_per_second(),
                eta: speed.eta(size.saturating_sub(received)),
            });
        }

        let blob = session.take_blob();
        info!(file_id = %file_id, size = blob.len(), "download completed");
        self.emit(DownloadEvent::Completed {
            file_id: file_id.clone(),
            size: blob.len() as u64,
        });
        self.emit_status(&file_id, DownloadStatus::Idle);

        Ok(DownloadOutcome::Completed(blob))
    }

    async fn fetch(
        &self,
        file_id: &str,
        index: u32,
        range: ByteRange,
    ) -> Result<Vec<u8>, DownloadError> {
        let data = self
            .source
            .fetch_range(file_id, range)
            .await
            .map_err(|e| match e {
                DownloadError::Retrieval { .. } => e,
                other => DownloadError::Retrieval {
                    chunk: index,
                    message: other.to_string(),
                },
            })?;

        if data.len() as u64 != range.len() {
            return Err(DownloadError::Retrieval {
                chunk: index,
                message: format!("expected {} bytes, got {}", range.len(), data.len()),
            });
        }
        Ok(data)
    }

    fn emit_status(&self, file_id: &str, status: DownloadStatus) {
        self.emit(DownloadEvent::StatusChanged {
            file_id: file_id.to_string(),
            status,
        });
    }

    fn emit(&self, event: DownloadEvent) {
        let _ = self.events_tx.try_send(event);
    }
}
