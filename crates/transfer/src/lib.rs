//! Chunked transfer primitives: fixed-size chunking, Merkle content
//! identifiers, session state and progress accounting.

mod chunked;
mod config;
mod digest;
mod merkle;
mod progress;
mod status;
mod types;
mod validation;

pub use chunked::{ChunkReader, ChunkedFile, Chunker, RawChunk, chunk_count, chunk_range};
pub use config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_HASH_WORKERS, DEFAULT_UPLOAD_CONCURRENCY, TransferConfig,
};
pub use digest::{ContentId, DIGEST_LEN, HashValue, hash_bytes, hash_pair};
pub use merkle::{MerkleTree, compute_root};
pub use progress::{ProgressCounter, SpeedCalculator, format_size, percent_ceil, percent_floor};
pub use status::TransferStatus;
pub use types::{ByteRange, Chunk, UploadSession};
pub use validation::{validate_file_name, validate_session};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("illegal status transition: {from} -> {to}")]
    InvalidTransition {
        from: TransferStatus,
        to: TransferStatus,
    },

    #[error("worker pool error: {0}")]
    WorkerPool(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
