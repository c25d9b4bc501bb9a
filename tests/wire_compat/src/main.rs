fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use slicedrop_protocol::{ApiResponse, CheckCode, FileRecord, FileUploadInfo, UploadUrls};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Drops `null` object members.
    ///
    /// The store writes `null` for unset properties; we omit them. Both mean
    /// "absent".
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Object(map) => {
                let normalized: serde_json::Map<String, serde_json::Value> = map
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect();
                serde_json::Value::Object(normalized)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent, null-normalized comparison).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        let norm_fixture = normalize_value(&fixture);
        let norm_reserialized = normalize_value(&reserialized);
        assert_eq!(
            norm_fixture, norm_reserialized,
            "roundtrip mismatch for {name}:\n  Store: {fixture}\n  Rust:  {reserialized}"
        );
        parsed
    }

    // --- Multipart check ---

    #[test]
    fn fixture_check_exists() {
        let resp: ApiResponse<FileUploadInfo> = roundtrip_test("check_exists.json");
        assert_eq!(CheckCode::from_code(resp.code), CheckCode::Exists);
        assert!(resp.data.is_none());
    }

    #[test]
    fn fixture_check_uploading() {
        let resp: ApiResponse<FileUploadInfo> = roundtrip_test("check_uploading.json");
        assert_eq!(CheckCode::from_code(resp.code), CheckCode::Uploading);
        let info = resp.data.unwrap();
        assert_eq!(info.upload_id, "2~kLz0n7YbHcVd9Q1rWmJ3xTg");
        assert_eq!(info.list_parts, vec![1, 3]);
        assert!(info.content_type.is_empty());
    }

    #[test]
    fn fixture_check_not_uploaded() {
        let resp: ApiResponse<FileUploadInfo> = roundtrip_test("check_not_uploaded.json");
        assert_eq!(CheckCode::from_code(resp.code), CheckCode::NotUploaded);
    }

    #[test]
    fn fixture_error_envelope() {
        let resp: ApiResponse<FileUploadInfo> = roundtrip_test("error_envelope.json");
        assert_eq!(CheckCode::from_code(resp.code), CheckCode::Failed(500));
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.message, "storage backend unavailable");
    }

    // --- Session init / merge ---

    #[test]
    fn fixture_init_request() {
        let info: FileUploadInfo = roundtrip_test("init_request.json");
        assert!(info.upload_id.is_empty());
        assert_eq!(info.chunk_count, 3);
        assert_eq!(info.chunk_size, 5 * 1024 * 1024);
    }

    #[test]
    fn fixture_init_response() {
        let resp: ApiResponse<UploadUrls> = roundtrip_test("init_response.json");
        let urls = resp.into_result().unwrap().unwrap();
        assert_eq!(urls.urls.len(), 3);
        assert!(urls.urls[0].ends_with("partNumber=1"));
    }

    #[test]
    fn fixture_merge_response() {
        let resp: ApiResponse<String> = roundtrip_test("merge_response.json");
        assert_eq!(resp.into_result().unwrap().as_deref(), Some("2024/movie.mkv"));
    }

    // --- Listing ---

    #[test]
    fn fixture_file_list() {
        let resp: ApiResponse<Vec<FileRecord>> = roundtrip_test("file_list.json");
        let files = resp.into_result().unwrap().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].content_type, "video/x-matroska");
        assert!(files[1].content_type.is_empty());
        assert_eq!(files[1].size, 512);
    }

    #[test]
    fn file_record_ignores_unknown_fields() {
        let json = r#"{
            "id": 3,
            "originFileName": "a.bin",
            "size": 1,
            "md5": "00",
            "createTime": "2024-05-01T10:00:00",
            "isDelete": 0
        }"#;
        let rec: FileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.id, 3);
    }
}
