//! HTTP client for the slicedrop file store.
//!
//! [`HttpStore`] implements both [`slicedrop_upload::ContentStore`] and
//! [`slicedrop_download::RangeSource`] on top of the store's REST API.

pub mod client;
pub mod mapping;

pub use client::{HttpError, HttpStore};
