use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::digest::{ContentId, HashValue};

/// Half-open byte range `[start, end)` within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// HTTP `Range` header value (`bytes=first-last`, inclusive bounds).
    pub fn to_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end.saturating_sub(1))
    }
}

/// A hashed chunk of file data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the file.
    pub index: u32,
    pub range: ByteRange,
    /// SHA-256 of `data`.
    pub hash: HashValue,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn len(&self) -> u64 {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// A negotiated multipart upload session.
///
/// Owned by the control flow that drives the upload; nothing else mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub session_id: String,
    pub content_id: ContentId,
    pub chunk_count: u32,
    pub chunk_size: u64,
    /// Target location per chunk index (presigned URLs for the HTTP store).
    pub targets: Vec<String>,
    /// Indices already durably stored for this session.
    pub uploaded: BTreeSet<u32>,
}

impl UploadSession {
    /// Indices still missing, in ascending order.
    pub fn pending_indices(&self) -> Vec<u32> {
        (0..self.chunk_count)
            .filter(|i| !self.uploaded.contains(i))
            .collect()
    }

    /// Records a completed chunk transfer. Out-of-range indices are ignored.
    pub fn mark_uploaded(&mut self, index: u32) {
        if index < self.chunk_count {
            self.uploaded.insert(index);
        }
    }

    /// `true` once every index is stored.
    pub fn is_complete(&self) -> bool {
        self.uploaded.len() == self.chunk_count as usize
    }

    /// Target location for a chunk index.
    pub fn target(&self, index: u32) -> Option<&str> {
        self.targets.get(index as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::hash_bytes;

    fn session(chunk_count: u32, uploaded: &[u32]) -> UploadSession {
        UploadSession {
            session_id: "s1".into(),
            content_id: ContentId::new(hash_bytes(b"content")),
            chunk_count,
            chunk_size: 4,
            targets: (0..chunk_count).map(|i| format!("http://store/part/{i}")).collect(),
            uploaded: uploaded.iter().copied().collect(),
        }
    }

    #[test]
    fn range_header_uses_inclusive_end() {
        assert_eq!(ByteRange::new(0, 10).to_header(), "bytes=0-9");
        assert_eq!(ByteRange::new(10, 12).to_header(), "bytes=10-11");
    }

    #[test]
    fn pending_excludes_uploaded() {
        let s = session(5, &[0, 3]);
        assert_eq!(s.pending_indices(), vec![1, 2, 4]);
        assert!(!s.is_complete());
    }

    #[test]
    fn mark_uploaded_completes_session() {
        let mut s = session(3, &[1]);
        s.mark_uploaded(0);
        s.mark_uploaded(2);
        s.mark_uploaded(7);
        assert!(s.is_complete());
        assert!(s.pending_indices().is_empty());
    }

    #[test]
    fn target_lookup() {
        let s = session(2, &[]);
        assert_eq!(s.target(1), Some("http://store/part/1"));
        assert_eq!(s.target(2), None);
    }
}
