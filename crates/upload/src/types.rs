//! Data types for the upload flow.

use std::collections::BTreeSet;
use std::sync::Arc;

use slicedrop_transfer::{ChunkedFile, ContentId, TransferError, TransferStatus};

/// Answer of the store's dedup lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupLookup {
    /// Content already stored.
    Exists,
    /// A session for this content was started earlier and not finalized.
    InProgress {
        session_id: String,
        uploaded: BTreeSet<u32>,
    },
    /// Unknown content.
    Missing,
}

/// Content type used when the caller does not know the file's type.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Descriptive metadata sent along with session negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

impl FileMetadata {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            content_type: DEFAULT_CONTENT_TYPE.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        if !content_type.is_empty() {
            self.content_type = content_type;
        }
        self
    }
}

/// Parameters for opening (or resuming) a multipart session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub content_id: ContentId,
    pub chunk_count: u32,
    pub chunk_size: u64,
    pub metadata: FileMetadata,
    /// Session reported by the dedup lookup, if any.
    pub resume_session: Option<String>,
}

/// Progress event emitted during uploads.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    StatusChanged {
        file: String,
        status: TransferStatus,
    },
    Progress {
        file: String,
        percent: u8,
        transferred: u64,
        total: u64,
    },
    ChunkFailed {
        file: String,
        index: u32,
        attempt: u32,
        error: String,
    },
}

/// What a successful upload did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub content_id: ContentId,
    /// `true` when the store already had the content.
    pub deduplicated: bool,
    /// Chunk transfers that succeeded in this run.
    pub transferred_chunks: usize,
    /// Chunks the store already held for a resumed session.
    pub resumed_chunks: usize,
}

/// Result of one file in a batch upload.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub file: String,
    pub success: bool,
    pub report: Option<UploadReport>,
    pub error: Option<String>,
}

/// A file record moving through the upload state machine.
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub metadata: FileMetadata,
    status: TransferStatus,
    progress: u8,
    chunked: Option<Arc<ChunkedFile>>,
    content_id: Option<ContentId>,
}

impl UploadTask {
    /// A fresh task in `preparing`.
    pub fn new(metadata: FileMetadata) -> Self {
        Self {
            metadata,
            status: TransferStatus::Preparing,
            progress: 0,
            chunked: None,
            content_id: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn content_id(&self) -> Option<ContentId> {
        self.content_id
    }

    pub fn chunked(&self) -> Option<&ChunkedFile> {
        self.chunked.as_deref()
    }

    /// `true` once chunking finished and the content id is known.
    pub fn is_prepared(&self) -> bool {
        self.content_id.is_some()
    }

    pub(crate) fn set_status(&mut self, next: TransferStatus) -> Result<(), TransferError> {
        self.status = self.status.transition(next)?;
        Ok(())
    }

    /// Any status may fall into `error`.
    pub(crate) fn fail(&mut self) {
        self.status = TransferStatus::Error;
    }

    /// Progress never moves backwards within a run.
    pub(crate) fn set_progress(&mut self, percent: u8) {
        self.progress = percent.max(self.progress).min(100);
    }

    pub(crate) fn reset_progress(&mut self) {
        self.progress = 0;
    }

    pub(crate) fn attach(&mut self, chunked: ChunkedFile) {
        self.content_id = Some(chunked.content_id());
        self.chunked = Some(Arc::new(chunked));
    }

    pub(crate) fn shared_chunks(&self) -> Option<Arc<ChunkedFile>> {
        self.chunked.clone()
    }
}
