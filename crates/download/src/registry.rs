//! One download session per remote file.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use slicedrop_transfer::TransferError;
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;

use crate::session::{DownloadSession, DownloadStatus, PauseHandle};
use crate::source::RemoteFile;

struct Entry {
    session: Arc<AsyncMutex<DownloadSession>>,
    pause: PauseHandle,
    size: u64,
    chunk_size: u64,
}

/// Keeps the session of every file the user has started downloading, so a
/// later request for the same file resumes instead of starting over.
///
/// A running download holds its session's lock; pausing goes through the
/// session's [`PauseHandle`] and never waits for that lock.
#[derive(Default)]
pub struct SessionRegistry {
    entries: Mutex<HashMap<String, Entry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `file`, creating it on first use.
    ///
    /// A buffered session only resumes while the file's size and the chunk
    /// size are unchanged. Otherwise an idle session is replaced, dropping
    /// its buffer, and a running one is a validation error.
    pub fn session(
        &self,
        file: &RemoteFile,
        chunk_size: u64,
    ) -> Result<Arc<AsyncMutex<DownloadSession>>, TransferError> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get(&file.id) {
            if entry.size == file.size && entry.chunk_size == chunk_size {
                return Ok(Arc::clone(&entry.session));
            }
            if entry.pause.status() == DownloadStatus::Downloading {
                return Err(TransferError::Validation(format!(
                    "file {} changed layout ({} bytes / {} per chunk -> {} / {}) while downloading",
                    file.id, entry.size, entry.chunk_size, file.size, chunk_size
                )));
            }
            warn!(
                file_id = %file.id,
                old_size = entry.size,
                new_size = file.size,
                old_chunk_size = entry.chunk_size,
                new_chunk_size = chunk_size,
                "file layout changed, discarding buffered chunks"
            );
        }

        let session = DownloadSession::new(file.clone(), chunk_size)?;
        let pause = session.pause_handle();
        let session = Arc::new(AsyncMutex::new(session));
        entries.insert(
            file.id.clone(),
            Entry {
                session: Arc::clone(&session),
                pause,
                size: file.size,
                chunk_size,
            },
        );
        Ok(session)
    }

    /// Pauses the download of `file_id`. Returns `false` if it is not running.
    pub fn pause(&self, file_id: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(file_id)
            .is_some_and(|entry| entry.pause.pause())
    }

    /// Pauses every running download, returning how many were paused.
    pub fn pause_all(&self) -> usize {
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|entry| entry.pause.pause())
            .count()
    }

    pub fn status(&self, file_id: &str) -> Option<DownloadStatus> {
        self.entries
            .lock()
            .unwrap()
            .get(file_id)
            .map(|entry| entry.pause.status())
    }

    /// Forgets a file's session, discarding any buffered chunks.
    pub fn remove(&self, file_id: &str) -> bool {
        self.entries.lock().unwrap().remove(file_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
