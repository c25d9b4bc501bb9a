use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::TransferError;
use crate::config::TransferConfig;
use crate::digest::{ContentId, HashValue, hash_bytes};
use crate::merkle::{MerkleTree, compute_root};
use crate::types::{ByteRange, Chunk};

/// Number of chunks covering `size` bytes: `ceil(size / chunk_size)`.
pub fn chunk_count(size: u64, chunk_size: u64) -> u64 {
    size.div_ceil(chunk_size)
}

/// Byte range of chunk `index`. The last chunk may be short.
pub fn chunk_range(index: u64, size: u64, chunk_size: u64) -> ByteRange {
    let start = index.saturating_mul(chunk_size).min(size);
    let end = start.saturating_add(chunk_size).min(size);
    ByteRange::new(start, end)
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// An unhashed block read from a source.
#[derive(Debug)]
pub struct RawChunk {
    pub index: u32,
    pub range: ByteRange,
    pub data: Vec<u8>,
}

impl RawChunk {
    /// Hashes the block, producing an immutable [`Chunk`].
    pub fn hash(self) -> Chunk {
        Chunk {
            index: self.index,
            range: self.range,
            hash: hash_bytes(&self.data),
            data: self.data,
        }
    }
}

/// Reads a file in fixed-size chunks.
pub struct ChunkReader {
    file: std::fs::File,
    chunk_size: u64,
    next_index: u64,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    pub fn new(path: &Path, chunk_size: u64) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::Config("chunk_size must be > 0".into()));
        }
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        check_addressable(file_size, chunk_size)?;
        Ok(Self {
            file,
            chunk_size,
            next_index: 0,
            file_size,
        })
    }

    /// Reads the next chunk. Returns `None` at EOF.
    pub fn next_raw(&mut self) -> Result<Option<RawChunk>, TransferError> {
        if self.next_index >= self.chunk_count() {
            return Ok(None);
        }

        let range = chunk_range(self.next_index, self.file_size, self.chunk_size);
        let mut buf = vec![0u8; range.len() as usize];
        self.file.read_exact(&mut buf)?;

        let raw = RawChunk {
            index: self.next_index as u32,
            range,
            data: buf,
        };
        self.next_index += 1;
        Ok(Some(raw))
    }

    pub fn chunk_count(&self) -> u64 {
        chunk_count(self.file_size, self.chunk_size)
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

fn check_addressable(size: u64, chunk_size: u64) -> Result<(), TransferError> {
    let count = chunk_count(size, chunk_size);
    if count > u32::MAX as u64 {
        return Err(TransferError::Config(format!(
            "{size} bytes at chunk size {chunk_size} needs {count} chunks"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Chunker
// ---------------------------------------------------------------------------

/// A file split into hashed chunks, in index order.
#[derive(Debug, Clone)]
pub struct ChunkedFile {
    pub size: u64,
    pub chunk_size: u64,
    pub chunks: Vec<Chunk>,
}

impl ChunkedFile {
    pub fn chunk_count(&self) -> u32 {
        self.chunks.len() as u32
    }

    /// Chunk hashes in index order.
    pub fn hashes(&self) -> Vec<HashValue> {
        self.chunks.iter().map(|c| c.hash).collect()
    }

    /// Merkle root over the chunk hashes.
    pub fn content_id(&self) -> ContentId {
        ContentId::new(compute_root(&self.hashes()))
    }

    /// The full tree over the chunk hashes, every level kept.
    pub fn merkle_tree(&self) -> MerkleTree {
        MerkleTree::build(&self.hashes())
    }
}

/// Splits byte sources into fixed-size chunks, hashing them on a bounded
/// pool of blocking workers.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: u64,
    workers: usize,
}

impl Chunker {
    pub fn new(chunk_size: u64, workers: usize) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::Config("chunk_size must be > 0".into()));
        }
        Ok(Self {
            chunk_size,
            workers: workers.max(1),
        })
    }

    pub fn from_config(config: &TransferConfig) -> Result<Self, TransferError> {
        config.validate()?;
        Self::new(config.chunk_size, config.hash_workers)
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Chunks and hashes an in-memory buffer.
    pub async fn chunk_bytes(&self, data: Vec<u8>) -> Result<ChunkedFile, TransferError> {
        let size = data.len() as u64;
        check_addressable(size, self.chunk_size)?;

        let mut pool = HashPool::new(self.workers);
        for index in 0..chunk_count(size, self.chunk_size) {
            let range = chunk_range(index, size, self.chunk_size);
            let raw = RawChunk {
                index: index as u32,
                range,
                data: data[range.start as usize..range.end as usize].to_vec(),
            };
            pool.submit(raw).await?;
        }

        let chunks = pool.finish().await?;
        Ok(ChunkedFile {
            size,
            chunk_size: self.chunk_size,
            chunks,
        })
    }

    /// Chunks and hashes a file on disk.
    ///
    /// Reads are sequential; hashing overlaps with reading. Returns only
    /// after every chunk hash has completed.
    pub async fn chunk_file(&self, path: &Path) -> Result<ChunkedFile, TransferError> {
        let owned = path.to_path_buf();
        let chunk_size = self.chunk_size;
        let mut reader = tokio::task::spawn_blocking(move || ChunkReader::new(&owned, chunk_size))
            .await
            .map_err(|e| TransferError::WorkerPool(format!("task join error: {e}")))??;
        let size = reader.file_size();

        debug!(
            path = %path.display(),
            size,
            chunks = reader.chunk_count(),
            "chunking file"
        );

        let mut pool = HashPool::new(self.workers);
        loop {
            let (returned, raw) = tokio::task::spawn_blocking(move || {
                let raw = reader.next_raw();
                (reader, raw)
            })
            .await
            .map_err(|e| TransferError::WorkerPool(format!("task join error: {e}")))?;
            reader = returned;

            let Some(raw) = raw? else {
                break;
            };
            pool.submit(raw).await?;
        }

        let chunks = pool.finish().await?;
        Ok(ChunkedFile {
            size,
            chunk_size,
            chunks,
        })
    }
}

/// Bounded set of blocking hash tasks.
struct HashPool {
    permits: Arc<Semaphore>,
    tasks: JoinSet<Chunk>,
}

impl HashPool {
    fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            tasks: JoinSet::new(),
        }
    }

    /// Waits for a free worker, then hashes `raw` on it.
    async fn submit(&mut self, raw: RawChunk) -> Result<(), TransferError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| TransferError::WorkerPool("hash pool closed".into()))?;
        self.tasks.spawn_blocking(move || {
            let _permit = permit;
            raw.hash()
        });
        Ok(())
    }

    /// Barrier: waits for all hashes, then restores index order.
    async fn finish(mut self) -> Result<Vec<Chunk>, TransferError> {
        let mut chunks = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            let chunk =
                joined.map_err(|e| TransferError::WorkerPool(format!("hash task failed: {e}")))?;
            chunks.push(chunk);
        }
        chunks.sort_unstable_by_key(|c| c.index);
        Ok(chunks)
    }
}
