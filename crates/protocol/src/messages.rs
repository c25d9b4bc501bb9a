use serde::{Deserialize, Serialize};

use crate::envelope::null_as_default;

// ---------------------------------------------------------------------------
// Multipart upload
// ---------------------------------------------------------------------------

/// Multipart upload description.
///
/// Sent as the body of `POST /files/multipart/init`, and returned as the
/// `data` of a check response while an upload is in progress (then only
/// `uploadId` and `listParts` are meaningful).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadInfo {
    /// Existing session to resume; empty to start a new one.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub upload_id: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub origin_file_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chunk_size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chunk_count: u32,
    /// Content identifier (hex).
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub md5: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub content_type: String,
    /// 1-based part numbers already stored.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub list_parts: Vec<u32>,
}

/// Response of `POST /files/multipart/init`: one presigned URL per chunk,
/// indexed by zero-based chunk index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrls {
    pub upload_id: String,
    pub urls: Vec<String>,
}
