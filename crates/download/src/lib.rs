//! Download flow for chunked, pausable downloads.
//!
//! Chunks are fetched strictly in order, one range request at a time, and
//! buffered until the whole file is present. A paused or failed download
//! keeps its buffer; calling [`DownloadCoordinator::download`] again with
//! the same session continues from the first missing chunk.

pub mod coordinator;
pub mod error;
pub mod registry;
pub mod session;
pub mod source;

pub use coordinator::{DownloadCoordinator, DownloadEvent, DownloadOutcome};
pub use error::DownloadError;
pub use registry::SessionRegistry;
pub use session::{DownloadSession, DownloadStatus, PauseHandle};
pub use source::{RangeSource, RemoteFile, SourceFuture};
