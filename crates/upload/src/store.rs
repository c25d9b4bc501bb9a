//! Store collaborator trait.
//!
//! `ContentStore` is implemented on top of the actual storage service
//! (see `slicedrop-http`). Using a trait keeps the upload logic decoupled
//! from transport and testable with in-memory stores.

use std::future::Future;
use std::pin::Pin;

use slicedrop_transfer::{ContentId, UploadSession};

use crate::error::UploadError;
use crate::types::{DedupLookup, SessionRequest};

/// Boxed future returned by store calls.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// Abstract storage service consumed by the upload coordinator.
pub trait ContentStore: Send + Sync {
    /// Looks up content by identifier.
    fn lookup<'a>(&'a self, content_id: &'a ContentId) -> StoreFuture<'a, DedupLookup>;

    /// Opens a session, or resumes `request.resume_session`.
    fn negotiate<'a>(&'a self, request: &'a SessionRequest) -> StoreFuture<'a, UploadSession>;

    /// Sends one chunk body to its target location.
    fn transfer_chunk<'a>(
        &'a self,
        target: &'a str,
        data: &'a [u8],
        content_type: &'a str,
    ) -> StoreFuture<'a, ()>;

    /// Merges the stored chunks into the final object.
    fn finalize<'a>(&'a self, content_id: &'a ContentId) -> StoreFuture<'a, ()>;
}
