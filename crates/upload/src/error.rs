//! Upload error types.

use slicedrop_transfer::TransferError;

/// Errors produced during an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("store error: {0}")]
    Store(String),

    #[error("chunk {index} transfer failed: {message}")]
    ChunkTransfer { index: u32, message: String },

    #[error("{failed} chunk(s) still failing after {attempts} attempt(s)")]
    BatchFailed { failed: usize, attempts: u32 },

    #[error("{missing} chunk(s) not stored, refusing to finalize")]
    Incomplete { missing: usize },

    #[error("file not prepared: {0}")]
    NotPrepared(String),
}
