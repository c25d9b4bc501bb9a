use serde::{Deserialize, Serialize};

use crate::envelope::null_as_default;

/// A file known to the store, as returned by `GET /files/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    pub origin_file_name: String,
    /// Object key inside the bucket.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub object: String,
    pub size: u64,
    /// Content identifier (hex). Named `md5` on the wire for compatibility.
    #[serde(rename = "md5")]
    pub content_id: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_record_wire_names() {
        let json = r#"{
            "id": 7,
            "originFileName": "movie.mkv",
            "object": "2024/movie.mkv",
            "size": 12582912,
            "md5": "ab12"
        }"#;
        let rec: FileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.id, 7);
        assert_eq!(rec.origin_file_name, "movie.mkv");
        assert_eq!(rec.size, 12 * 1024 * 1024);
        assert_eq!(rec.content_id, "ab12");
        assert!(rec.content_type.is_empty());

        let back = serde_json::to_value(&rec).unwrap();
        assert_eq!(back["md5"], "ab12");
        assert!(back.get("contentType").is_none());
    }
}
