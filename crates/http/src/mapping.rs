//! Conversions between the store's wire types and the coordinators' types.

use std::collections::BTreeSet;

use slicedrop_download::RemoteFile;
use slicedrop_protocol::{ApiError, ApiResponse, CheckCode, FileRecord, FileUploadInfo, UploadUrls};
use slicedrop_transfer::{ContentId, TransferError, UploadSession};
use slicedrop_upload::{DEFAULT_CONTENT_TYPE, DedupLookup, SessionRequest};

use crate::client::HttpError;

/// Interprets the envelope of `GET /files/multipart/check/{id}`.
pub fn lookup_from_check(resp: ApiResponse<FileUploadInfo>) -> Result<DedupLookup, HttpError> {
    match CheckCode::from_code(resp.code) {
        CheckCode::Exists => Ok(DedupLookup::Exists),
        CheckCode::NotUploaded => Ok(DedupLookup::Missing),
        CheckCode::Uploading => {
            let info = resp.data.ok_or_else(|| {
                HttpError::Protocol("upload in progress but no session reported".into())
            })?;
            if info.upload_id.is_empty() {
                return Err(HttpError::Protocol(
                    "upload in progress without an upload id".into(),
                ));
            }
            Ok(DedupLookup::InProgress {
                uploaded: parts_to_indices(&info.list_parts)?,
                session_id: info.upload_id,
            })
        }
        CheckCode::Failed(code) => Err(HttpError::Api(ApiError {
            code,
            message: resp.msg,
        })),
    }
}

/// Converts 1-based part numbers to 0-based chunk indices.
///
/// Upper bounds are checked against the negotiated session later; part `0`
/// can never be valid.
pub fn parts_to_indices(parts: &[u32]) -> Result<BTreeSet<u32>, HttpError> {
    parts
        .iter()
        .map(|&part| {
            part.checked_sub(1).ok_or_else(|| {
                HttpError::from(TransferError::Validation(
                    "part numbers start at 1, got 0".into(),
                ))
            })
        })
        .collect()
}

/// Body of `POST /files/multipart/init`.
pub fn init_request(request: &SessionRequest) -> FileUploadInfo {
    FileUploadInfo {
        upload_id: request.resume_session.clone().unwrap_or_default(),
        origin_file_name: request.metadata.name.clone(),
        size: request.metadata.size,
        chunk_size: request.chunk_size,
        chunk_count: request.chunk_count,
        md5: request.content_id.to_hex(),
        content_type: request.metadata.content_type.clone(),
        list_parts: Vec::new(),
    }
}

/// Builds the session from the init response. The store returns one URL
/// per chunk, in chunk order; which chunks it already holds comes from the
/// check response.
pub fn session_from_urls(request: &SessionRequest, urls: UploadUrls) -> UploadSession {
    UploadSession {
        session_id: urls.upload_id,
        content_id: request.content_id,
        chunk_count: request.chunk_count,
        chunk_size: request.chunk_size,
        targets: urls.urls,
        uploaded: BTreeSet::new(),
    }
}

pub fn remote_file(record: FileRecord) -> RemoteFile {
    RemoteFile {
        id: record.id.to_string(),
        content_id: ContentId::from_hex(&record.content_id).ok(),
        name: record.origin_file_name,
        size: record.size,
        content_type: if record.content_type.is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            record.content_type
        },
    }
}
