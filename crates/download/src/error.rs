//! Download error types.

use slicedrop_transfer::TransferError;

/// Errors produced during a download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("source error: {0}")]
    Source(String),

    #[error("chunk {chunk} retrieval failed: {message}")]
    Retrieval { chunk: u32, message: String },
}
