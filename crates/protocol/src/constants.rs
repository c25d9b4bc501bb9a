/// Envelope code of a successful call.
pub const CODE_OK: i32 = 200;

/// Outcome of `GET /files/multipart/check/{md5}`, carried in the envelope code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckCode {
    /// Content already stored; nothing to upload.
    Exists,
    /// A multipart upload for this content is in progress; `data` lists
    /// the parts already stored.
    Uploading,
    /// Store has never seen this content.
    NotUploaded,
    /// Any other code.
    Failed(i32),
}

impl CheckCode {
    pub const UPLOADING: i32 = 2001;
    pub const NOT_UPLOADED: i32 = 2002;

    pub fn from_code(code: i32) -> Self {
        match code {
            CODE_OK => CheckCode::Exists,
            Self::UPLOADING => CheckCode::Uploading,
            Self::NOT_UPLOADED => CheckCode::NotUploaded,
            other => CheckCode::Failed(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            CheckCode::Exists => CODE_OK,
            CheckCode::Uploading => Self::UPLOADING,
            CheckCode::NotUploaded => Self::NOT_UPLOADED,
            CheckCode::Failed(code) => code,
        }
    }
}
