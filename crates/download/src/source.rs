//! Range source collaborator trait.

use std::future::Future;
use std::pin::Pin;

use slicedrop_transfer::{ByteRange, ContentId};

use crate::error::DownloadError;

/// Boxed future returned by source calls.
pub type SourceFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, DownloadError>> + Send + 'a>>;

/// A stored file as listed by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub content_type: String,
    /// `None` when the store reports an identifier we cannot parse.
    pub content_id: Option<ContentId>,
}

/// Abstract byte-range retrieval consumed by the download coordinator.
pub trait RangeSource: Send + Sync {
    /// Lists the files available for download.
    fn list_files(&self) -> SourceFuture<'_, Vec<RemoteFile>>;

    /// Fetches exactly the bytes of `range` from file `file_id`.
    fn fetch_range<'a>(&'a self, file_id: &'a str, range: ByteRange) -> SourceFuture<'a, Vec<u8>>;
}
