use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::CODE_OK;

/// Error carried by a non-200 envelope.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("store returned code {code}: {message}")]
pub struct ApiError {
    pub code: i32,
    pub message: String,
}

/// Treats an explicit `null` like a missing field. The store's JSON
/// serializer writes `null` for every unset property.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response envelope used by every JSON endpoint of the store:
/// `{"code": 200, "msg": "...", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub code: i32,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A 200 envelope around `data`.
    pub fn ok(data: T) -> Self {
        Self {
            code: CODE_OK,
            msg: String::new(),
            data: Some(data),
        }
    }

    /// A failure envelope with no data.
    pub fn error(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    /// Converts a 200 envelope into its payload (which may be absent).
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.is_ok() {
            Ok(self.data)
        } else {
            Err(ApiError {
                code: self.code,
                message: self.msg,
            })
        }
    }
}
