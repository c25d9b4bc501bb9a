//! Per-file download state.

use std::fmt;
use std::sync::{Arc, Mutex};

use slicedrop_transfer::{ByteRange, TransferError, chunk_count, chunk_range};

use crate::source::RemoteFile;

/// Download state of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadStatus {
    Idle,
    Downloading,
    Paused,
    Error,
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DownloadStatus::Idle => "idle",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Paused => "paused",
            DownloadStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Cloneable handle that pauses a running download.
///
/// The download loop checks the status before each chunk, so a pause takes
/// effect once the in-flight retrieval (if any) has been buffered.
#[derive(Debug, Clone)]
pub struct PauseHandle {
    status: Arc<Mutex<DownloadStatus>>,
}

impl PauseHandle {
    /// Requests a pause. Returns `false` if the download was not running.
    pub fn pause(&self) -> bool {
        let mut status = self.status.lock().unwrap();
        if *status == DownloadStatus::Downloading {
            *status = DownloadStatus::Paused;
            true
        } else {
            false
        }
    }

    pub fn status(&self) -> DownloadStatus {
        *self.status.lock().unwrap()
    }
}

/// Buffer and status of one file's download.
///
/// `buffer[i]` holds chunk `i`; chunks are only ever appended in order, so
/// the next chunk to fetch is always `buffer.len()`.
#[derive(Debug)]
pub struct DownloadSession {
    file: RemoteFile,
    chunk_size: u64,
    total_chunks: u32,
    buffer: Vec<Vec<u8>>,
    status: Arc<Mutex<DownloadStatus>>,
    progress: Option<u8>,
}

impl DownloadSession {
    pub fn new(file: RemoteFile, chunk_size: u64) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::Config("chunk_size must be > 0".into()));
        }
        let total = chunk_count(file.size, chunk_size);
        let total_chunks = u32::try_from(total).map_err(|_| {
            TransferError::Config(format!(
                "{} bytes in {chunk_size}-byte chunks exceeds the chunk index range",
                file.size
            ))
        })?;

        Ok(Self {
            file,
            chunk_size,
            total_chunks,
            buffer: Vec::new(),
            status: Arc::new(Mutex::new(DownloadStatus::Idle)),
            progress: None,
        })
    }

    pub fn file(&self) -> &RemoteFile {
        &self.file
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    pub fn status(&self) -> DownloadStatus {
        *self.status.lock().unwrap()
    }

    /// `None` before the first chunk of a cycle arrives.
    pub fn progress(&self) -> Option<u8> {
        self.progress
    }

    pub fn pause_handle(&self) -> PauseHandle {
        PauseHandle {
            status: Arc::clone(&self.status),
        }
    }

    /// Zero-based index of the next chunk to fetch.
    pub fn next_chunk_index(&self) -> u32 {
        self.buffer.len() as u32
    }

    pub fn buffered_chunks(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffered_bytes(&self) -> u64 {
        self.buffer.iter().map(|c| c.len() as u64).sum()
    }

    /// Byte range of zero-based chunk `index`.
    pub fn chunk_range(&self, index: u32) -> ByteRange {
        chunk_range(index as u64, self.file.size, self.chunk_size)
    }

    pub(crate) fn set_status(&self, status: DownloadStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub(crate) fn push_chunk(&mut self, data: Vec<u8>, progress: u8) {
        self.buffer.push(data);
        self.progress = Some(progress);
    }

    /// Concatenates the buffer and starts a fresh cycle: buffer emptied,
    /// status idle, progress cleared.
    pub(crate) fn take_blob(&mut self) -> Vec<u8> {
        let blob = std::mem::take(&mut self.buffer).concat();
        self.progress = None;
        self.set_status(DownloadStatus::Idle);
        blob
    }
}
