use serde::{Deserialize, Serialize};

use crate::TransferError;

/// Default chunk size: 5 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Default number of chunk transfers in flight per file.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 3;

/// Default number of blocking workers hashing chunks.
pub const DEFAULT_HASH_WORKERS: usize = 4;

/// Transfer policy passed into the chunker and both coordinators.
///
/// Separate sessions may run with different policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Upper bound on concurrent chunk transfers within one file's batch.
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,

    #[serde(default = "default_hash_workers")]
    pub hash_workers: usize,

    /// Transfer rounds per upload. `1` fails the upload on the first chunk
    /// error; higher values retry only the chunks that failed.
    #[serde(default = "default_max_chunk_attempts")]
    pub max_chunk_attempts: u32,
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

fn default_upload_concurrency() -> usize {
    DEFAULT_UPLOAD_CONCURRENCY
}

fn default_hash_workers() -> usize {
    DEFAULT_HASH_WORKERS
}

fn default_max_chunk_attempts() -> u32 {
    1
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            upload_concurrency: default_upload_concurrency(),
            hash_workers: default_hash_workers(),
            max_chunk_attempts: default_max_chunk_attempts(),
        }
    }
}

impl TransferConfig {
    /// Rejects zero-valued limits.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.chunk_size == 0 {
            return Err(TransferError::Config("chunk_size must be > 0".into()));
        }
        if self.chunk_size > u32::MAX as u64 {
            return Err(TransferError::Config(format!(
                "chunk_size {} exceeds {}",
                self.chunk_size,
                u32::MAX
            )));
        }
        if self.upload_concurrency == 0 {
            return Err(TransferError::Config(
                "upload_concurrency must be > 0".into(),
            ));
        }
        if self.hash_workers == 0 {
            return Err(TransferError::Config("hash_workers must be > 0".into()));
        }
        if self.max_chunk_attempts == 0 {
            return Err(TransferError::Config(
                "max_chunk_attempts must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = TransferConfig::default();
        assert_eq!(c.chunk_size, 5 * 1024 * 1024);
        assert_eq!(c.upload_concurrency, 3);
        assert_eq!(c.max_chunk_attempts, 1);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let c: TransferConfig = serde_json::from_str(r#"{"chunk_size": 1024}"#).unwrap();
        assert_eq!(c.chunk_size, 1024);
        assert_eq!(c.upload_concurrency, DEFAULT_UPLOAD_CONCURRENCY);
        assert_eq!(c.hash_workers, DEFAULT_HASH_WORKERS);
    }

    #[test]
    fn zero_values_rejected() {
        let mut c = TransferConfig::default();
        c.chunk_size = 0;
        assert!(matches!(c.validate(), Err(TransferError::Config(_))));

        let mut c = TransferConfig::default();
        c.upload_concurrency = 0;
        assert!(c.validate().is_err());

        let mut c = TransferConfig::default();
        c.max_chunk_attempts = 0;
        assert!(c.validate().is_err());
    }
}
