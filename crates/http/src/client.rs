//! slicedrop REST client.
//!
//! Async HTTP client using `reqwest`. JSON endpoints answer with the
//! `{code, msg, data}` envelope; chunk bodies go straight to presigned URLs.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, RANGE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use slicedrop_download::{DownloadError, RangeSource, RemoteFile, SourceFuture};
use slicedrop_protocol::{ApiError, ApiResponse, FileRecord, FileUploadInfo, UploadUrls};
use slicedrop_transfer::{ByteRange, ContentId, TransferError, UploadSession};
use slicedrop_upload::{ContentStore, DedupLookup, SessionRequest, StoreFuture, UploadError};
use tracing::debug;

use crate::mapping::{init_request, lookup_from_check, remote_file, session_from_urls};

/// Errors from the store client.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl From<HttpError> for UploadError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Transfer(e) => UploadError::Transfer(e),
            other => UploadError::Store(other.to_string()),
        }
    }
}

impl From<HttpError> for DownloadError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Transfer(e) => DownloadError::Transfer(e),
            other => DownloadError::Source(other.to_string()),
        }
    }
}

/// Client for one store deployment.
pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    /// Creates a client for the API rooted at `base_url`
    /// (e.g. `http://localhost:8080`). `timeout` bounds every request.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Returns the body of a 2xx response, or the status and body as an error.
    async fn success_body(resp: reqwest::Response) -> Result<Vec<u8>, HttpError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, HttpError> {
        let resp = self.http.get(self.url(path)).send().await?;
        let body = Self::success_body(resp).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, HttpError> {
        let mut req = self.http.post(self.url(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        let body = Self::success_body(req.send().await?).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `GET /files/multipart/check/{id}`.
    pub async fn check(&self, content_id: &ContentId) -> Result<DedupLookup, HttpError> {
        let resp: ApiResponse<FileUploadInfo> = self
            .get_json(&format!("/files/multipart/check/{}", content_id.to_hex()))
            .await?;
        let lookup = lookup_from_check(resp)?;
        debug!(content_id = %content_id, ?lookup, "check");
        Ok(lookup)
    }

    /// `POST /files/multipart/init`.
    pub async fn init(&self, request: &SessionRequest) -> Result<UploadSession, HttpError> {
        let body = init_request(request);
        let resp: ApiResponse<UploadUrls> =
            self.post_json("/files/multipart/init", Some(&body)).await?;
        let urls = resp
            .into_result()?
            .ok_or_else(|| HttpError::Protocol("init response without data".into()))?;
        debug!(
            content_id = %request.content_id,
            upload_id = %urls.upload_id,
            urls = urls.urls.len(),
            "session opened"
        );
        Ok(session_from_urls(request, urls))
    }

    /// `PUT` of one chunk body to its presigned URL.
    pub async fn put_chunk(
        &self,
        url: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), HttpError> {
        let resp = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(data.to_vec())
            .send()
            .await?;
        Self::success_body(resp).await?;
        Ok(())
    }

    /// `POST /files/multipart/merge/{id}`.
    pub async fn merge(&self, content_id: &ContentId) -> Result<(), HttpError> {
        let resp: ApiResponse<serde_json::Value> = self
            .post_json::<(), _>(
                &format!("/files/multipart/merge/{}", content_id.to_hex()),
                None,
            )
            .await?;
        resp.into_result()?;
        Ok(())
    }

    /// `GET /files/list`.
    pub async fn list(&self) -> Result<Vec<RemoteFile>, HttpError> {
        let resp: ApiResponse<Vec<FileRecord>> = self.get_json("/files/list").await?;
        let records = resp.into_result()?.unwrap_or_default();
        Ok(records.into_iter().map(remote_file).collect())
    }

    /// `GET /files/download/{id}` with a `Range` header.
    pub async fn range(&self, file_id: &str, range: ByteRange) -> Result<Vec<u8>, HttpError> {
        let resp = self
            .http
            .get(self.url(&format!("/files/download/{file_id}")))
            .header(RANGE, range.to_header())
            .send()
            .await?;
        Self::success_body(resp).await
    }
}

impl ContentStore for HttpStore {
    fn lookup<'a>(&'a self, content_id: &'a ContentId) -> StoreFuture<'a, DedupLookup> {
        Box::pin(async move { Ok(self.check(content_id).await?) })
    }

    fn negotiate<'a>(&'a self, request: &'a SessionRequest) -> StoreFuture<'a, UploadSession> {
        Box::pin(async move { Ok(self.init(request).await?) })
    }

    fn transfer_chunk<'a>(
        &'a self,
        target: &'a str,
        data: &'a [u8],
        content_type: &'a str,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move { Ok(self.put_chunk(target, data, content_type).await?) })
    }

    fn finalize<'a>(&'a self, content_id: &'a ContentId) -> StoreFuture<'a, ()> {
        Box::pin(async move { Ok(self.merge(content_id).await?) })
    }
}

impl RangeSource for HttpStore {
    fn list_files(&self) -> SourceFuture<'_, Vec<RemoteFile>> {
        Box::pin(async move { Ok(self.list().await?) })
    }

    fn fetch_range<'a>(&'a self, file_id: &'a str, range: ByteRange) -> SourceFuture<'a, Vec<u8>> {
        Box::pin(async move { Ok(self.range(file_id, range).await?) })
    }
}
