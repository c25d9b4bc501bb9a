use std::path::{Component, Path};

use crate::TransferError;
use crate::digest::ContentId;
use crate::types::UploadSession;

/// Checks a negotiated session against the local chunk layout.
///
/// The store's view must never be coerced into ours: any mismatch fails the
/// session.
pub fn validate_session(
    session: &UploadSession,
    content_id: &ContentId,
    chunk_count: u32,
    chunk_size: u64,
) -> Result<(), TransferError> {
    if session.content_id != *content_id {
        return Err(TransferError::Validation(format!(
            "session {} is for content {}, expected {}",
            session.session_id, session.content_id, content_id
        )));
    }
    if session.chunk_count != chunk_count {
        return Err(TransferError::Validation(format!(
            "session {} reports {} chunks, local file has {}",
            session.session_id, session.chunk_count, chunk_count
        )));
    }
    if session.chunk_size != chunk_size {
        return Err(TransferError::Validation(format!(
            "session {} uses chunk size {}, local chunk size is {}",
            session.session_id, session.chunk_size, chunk_size
        )));
    }
    if let Some(&bad) = session.uploaded.iter().find(|&&i| i >= chunk_count) {
        return Err(TransferError::Validation(format!(
            "uploaded index {bad} outside [0, {chunk_count})"
        )));
    }
    let missing_targets = session
        .pending_indices()
        .into_iter()
        .find(|&i| session.target(i).is_none_or(str::is_empty));
    if let Some(index) = missing_targets {
        return Err(TransferError::Validation(format!(
            "no target location for chunk {index} ({} targets for {chunk_count} chunks)",
            session.targets.len()
        )));
    }
    Ok(())
}

/// Validates that a file name stays inside the directory it is joined to.
///
/// Rejects:
/// - Empty names
/// - Absolute paths (Unix `/` or Windows `C:\`)
/// - Parent directory traversal (`..`)
/// - Windows prefix components (`C:`, `\\server`)
pub fn validate_file_name(name: &str) -> Result<(), TransferError> {
    if name.is_empty() {
        return Err(TransferError::InvalidPath("empty path".into()));
    }

    let path = Path::new(name);

    if path.is_absolute() {
        return Err(TransferError::InvalidPath(format!(
            "absolute path not allowed: {name}"
        )));
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(TransferError::InvalidPath(format!(
                    "parent directory traversal not allowed: {name}"
                )));
            }
            Component::Prefix(_) => {
                return Err(TransferError::InvalidPath(format!(
                    "path prefix not allowed: {name}"
                )));
            }
            Component::RootDir => {
                return Err(TransferError::InvalidPath(format!(
                    "absolute path not allowed: {name}"
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::hash_bytes;

    fn content() -> ContentId {
        ContentId::new(hash_bytes(b"file"))
    }

    fn session(uploaded: &[u32], targets: usize) -> UploadSession {
        UploadSession {
            session_id: "s1".into(),
            content_id: content(),
            chunk_count: 4,
            chunk_size: 8,
            targets: (0..targets).map(|i| format!("u{i}")).collect(),
            uploaded: uploaded.iter().copied().collect(),
        }
    }

    #[test]
    fn accepts_consistent_session() {
        assert!(validate_session(&session(&[0, 2], 4), &content(), 4, 8).is_ok());
    }

    #[test]
    fn rejects_uploaded_index_out_of_range() {
        let err = validate_session(&session(&[1, 4], 4), &content(), 4, 8).unwrap_err();
        assert!(matches!(err, TransferError::Validation(ref m) if m.contains("index 4")));
    }

    #[test]
    fn rejects_chunk_count_mismatch() {
        assert!(validate_session(&session(&[], 4), &content(), 5, 8).is_err());
    }

    #[test]
    fn rejects_chunk_size_mismatch() {
        assert!(validate_session(&session(&[], 4), &content(), 4, 16).is_err());
    }

    #[test]
    fn rejects_other_content() {
        let other = ContentId::new(hash_bytes(b"other"));
        assert!(validate_session(&session(&[], 4), &other, 4, 8).is_err());
    }

    #[test]
    fn rejects_missing_targets_for_pending_chunks() {
        assert!(validate_session(&session(&[], 3), &content(), 4, 8).is_err());
    }

    #[test]
    fn missing_targets_fine_when_chunks_already_stored() {
        let mut s = session(&[0, 1, 2, 3], 0);
        assert!(validate_session(&s, &content(), 4, 8).is_ok());
        s.uploaded.remove(&3);
        assert!(validate_session(&s, &content(), 4, 8).is_err());
    }

    #[test]
    fn rejects_empty_name() {
        assert!(validate_file_name("").is_err());
    }

    #[test]
    fn rejects_parent_dir_traversal() {
        assert!(validate_file_name("../../../etc/passwd").is_err());
        assert!(validate_file_name("sub/../../../escape").is_err());
        assert!(validate_file_name("..").is_err());
    }

    #[test]
    fn rejects_absolute_unix_path() {
        assert!(validate_file_name("/tmp/malicious").is_err());
    }

    #[test]
    fn accepts_plain_names() {
        assert!(validate_file_name("report.pdf").is_ok());
        assert!(validate_file_name("./movie.mkv").is_ok());
        assert!(validate_file_name(".hidden").is_ok());
    }
}
