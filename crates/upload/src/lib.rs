//! Upload flow for chunked, deduplicated, resumable uploads.
//!
//! This crate implements the **control logic** only. It has no transport
//! dependencies: the caller provides a [`ContentStore`] implementation that
//! talks to the actual storage service.
//!
//! # Pipeline
//!
//! 1. **Prepare**: chunk and hash the file, fold the Merkle root
//! 2. **Dedup**: ask the store whether the content already exists
//! 3. **Negotiate**: open (or resume) a multipart session
//! 4. **Transfer**: send the missing chunks with bounded concurrency
//! 5. **Finalize**: have the store merge the chunks

pub mod coordinator;
pub mod error;
pub mod store;
pub mod types;

pub use coordinator::UploadCoordinator;
pub use error::UploadError;
pub use store::{ContentStore, StoreFuture};
pub use types::{
    DEFAULT_CONTENT_TYPE, DedupLookup, FileMetadata, SessionRequest, UploadEvent, UploadReport,
    UploadResult, UploadTask,
};
