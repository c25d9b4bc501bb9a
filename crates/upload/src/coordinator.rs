//! Upload coordinator.
//!
//! Drives one file at a time through dedup lookup, session negotiation,
//! bounded concurrent chunk transfer and finalize, reporting progress
//! through an event channel.

use std::collections::BTreeSet;
use std::path::Path;

use futures_util::stream::{self, StreamExt};
use slicedrop_transfer::{
    Chunk, ChunkedFile, Chunker, ProgressCounter, TransferConfig, TransferError, TransferStatus,
    UploadSession, validate_session,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::UploadError;
use crate::store::ContentStore;
use crate::types::{
    DedupLookup, FileMetadata, SessionRequest, UploadEvent, UploadReport, UploadResult, UploadTask,
};

/// Coordinates chunked uploads against a [`ContentStore`].
pub struct UploadCoordinator<'a> {
    store: &'a dyn ContentStore,
    config: TransferConfig,
    chunker: Chunker,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
}

impl<'a> UploadCoordinator<'a> {
    /// Creates a coordinator. Fails if `config` is invalid.
    pub fn new(store: &'a dyn ContentStore, config: TransferConfig) -> Result<Self, UploadError> {
        let chunker = Chunker::from_config(&config)?;
        let (events_tx, events_rx) = mpsc::channel(256);
        Ok(Self {
            store,
            config,
            chunker,
            events_tx,
            events_rx: Some(events_rx),
        })
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Chunks and hashes a file on disk into a task ready for upload.
    pub async fn prepare_file(
        &self,
        path: &Path,
        content_type: Option<&str>,
    ) -> Result<UploadTask, UploadError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| TransferError::InvalidPath(path.display().to_string()))?;

        self.emit(UploadEvent::StatusChanged {
            file: name.clone(),
            status: TransferStatus::Preparing,
        });
        let chunked = self.chunker.chunk_file(path).await?;

        let metadata = FileMetadata::new(name, chunked.size)
            .with_content_type(content_type.unwrap_or_default());
        self.finish_prepare(metadata, chunked)
    }

    /// Chunks and hashes an in-memory buffer. `metadata.size` is taken
    /// from the buffer.
    pub async fn prepare_bytes(
        &self,
        mut metadata: FileMetadata,
        data: Vec<u8>,
    ) -> Result<UploadTask, UploadError> {
        self.emit(UploadEvent::StatusChanged {
            file: metadata.name.clone(),
            status: TransferStatus::Preparing,
        });
        metadata.size = data.len() as u64;
        let chunked = self.chunker.chunk_bytes(data).await?;
        self.finish_prepare(metadata, chunked)
    }

    fn finish_prepare(
        &self,
        metadata: FileMetadata,
        chunked: ChunkedFile,
    ) -> Result<UploadTask, UploadError> {
        let mut task = UploadTask::new(metadata);
        task.attach(chunked);

        if let (Some(chunked), Some(content_id)) = (task.chunked(), task.content_id()) {
            debug!(
                file = %task.name(),
                size = chunked.size,
                chunks = chunked.chunk_count(),
                content_id = %content_id,
                "file prepared"
            );
        }

        self.set_status(&mut task, TransferStatus::PendingTransfer)?;
        Ok(task)
    }

    /// Uploads one prepared file.
    ///
    /// On failure the task is left in `error` and may be uploaded again;
    /// chunks the store already holds are not sent twice.
    pub async fn upload(&self, task: &mut UploadTask) -> Result<UploadReport, UploadError> {
        if !task.is_prepared() {
            return Err(UploadError::NotPrepared(task.name().to_string()));
        }
        self.set_status(task, TransferStatus::Transferring)?;
        task.reset_progress();

        match self.run(task).await {
            Ok(report) => {
                info!(
                    file = %task.name(),
                    content_id = %report.content_id,
                    deduplicated = report.deduplicated,
                    transferred = report.transferred_chunks,
                    resumed = report.resumed_chunks,
                    "upload completed"
                );
                Ok(report)
            }
            Err(e) => {
                task.fail();
                self.emit_status(task);
                error!(file = %task.name(), error = %e, "upload failed");
                Err(e)
            }
        }
    }

    /// Uploads several files one after another.
    ///
    /// Files that are not prepared or are already transferring are skipped
    /// and produce no result. A failing file does not stop the batch.
    pub async fn upload_all(&self, tasks: &mut [UploadTask]) -> Vec<UploadResult> {
        let mut results = Vec::with_capacity(tasks.len());

        for task in tasks.iter_mut() {
            if !task.is_prepared() || task.status() == TransferStatus::Transferring {
                debug!(file = %task.name(), status = %task.status(), "skipping file");
                continue;
            }

            let file = task.name().to_string();
            let result = match self.upload(task).await {
                Ok(report) => UploadResult {
                    file,
                    success: true,
                    report: Some(report),
                    error: None,
                },
                Err(e) => UploadResult {
                    file,
                    success: false,
                    report: None,
                    error: Some(e.to_string()),
                },
            };
            results.push(result);
        }

        results
    }

    async fn run(&self, task: &mut UploadTask) -> Result<UploadReport, UploadError> {
        let not_prepared = || UploadError::NotPrepared(task.name().to_string());
        let chunked = task.shared_chunks().ok_or_else(not_prepared)?;
        let content_id = task.content_id().ok_or_else(not_prepared)?;

        let (resume_session, known) = match self.store.lookup(&content_id).await? {
            DedupLookup::Exists => {
                info!(file = %task.name(), content_id = %content_id, "content already stored");
                self.complete(task)?;
                return Ok(UploadReport {
                    content_id,
                    deduplicated: true,
                    transferred_chunks: 0,
                    resumed_chunks: 0,
                });
            }
            DedupLookup::InProgress {
                session_id,
                uploaded,
            } => {
                debug!(
                    file = %task.name(),
                    session = %session_id,
                    parts = uploaded.len(),
                    "found unfinished session"
                );
                (Some(session_id), uploaded)
            }
            DedupLookup::Missing => (None, BTreeSet::new()),
        };

        let request = SessionRequest {
            content_id,
            chunk_count: chunked.chunk_count(),
            chunk_size: chunked.chunk_size,
            metadata: task.metadata.clone(),
            resume_session,
        };
        let mut session = self.store.negotiate(&request).await?;
        if request.resume_session.as_deref() == Some(session.session_id.as_str()) {
            session.uploaded.extend(known);
        }
        validate_session(
            &session,
            &content_id,
            request.chunk_count,
            request.chunk_size,
        )?;

        let pending = session.pending_indices();
        let resumed_chunks = session.uploaded.len();
        debug!(
            file = %task.name(),
            session = %session.session_id,
            pending = pending.len(),
            resumed = resumed_chunks,
            "session negotiated"
        );

        let transferred_chunks = self
            .transfer_pending(task, &chunked, &mut session, pending)
            .await?;

        if !session.is_complete() {
            return Err(UploadError::Incomplete {
                missing: session.pending_indices().len(),
            });
        }
        self.store.finalize(&content_id).await?;
        self.complete(task)?;

        Ok(UploadReport {
            content_id,
            deduplicated: false,
            transferred_chunks,
            resumed_chunks,
        })
    }

    /// Sends `pending` in rounds, each round retrying only what failed in
    /// the previous one, up to `max_chunk_attempts` rounds.
    async fn transfer_pending(
        &self,
        task: &mut UploadTask,
        chunked: &ChunkedFile,
        session: &mut UploadSession,
        pending: Vec<u32>,
    ) -> Result<usize, UploadError> {
        let total: u64 = pending
            .iter()
            .filter_map(|&i| chunked.chunks.get(i as usize))
            .map(Chunk::len)
            .sum();
        let counter = ProgressCounter::new(total);
        let max_attempts = self.config.max_chunk_attempts.max(1);

        let mut remaining = pending;
        let mut transferred = 0;
        let mut attempt = 0;

        while !remaining.is_empty() {
            attempt += 1;
            let (done, failed) = self
                .transfer_round(task, chunked, session, &remaining, &counter, attempt)
                .await;

            transferred += done.len();
            for index in done {
                session.mark_uploaded(index);
            }

            if failed.is_empty() {
                break;
            }
            if attempt >= max_attempts {
                return Err(UploadError::BatchFailed {
                    failed: failed.len(),
                    attempts: attempt,
                });
            }
            warn!(
                file = %task.name(),
                failed = failed.len(),
                attempt,
                "retrying failed chunks"
            );
            remaining = failed;
        }

        Ok(transferred)
    }

    /// One round of transfers with at most `upload_concurrency` in flight.
    /// Returns the indices that succeeded and the ones that failed.
    async fn transfer_round(
        &self,
        task: &mut UploadTask,
        chunked: &ChunkedFile,
        session: &UploadSession,
        indices: &[u32],
        counter: &ProgressCounter,
        attempt: u32,
    ) -> (Vec<u32>, Vec<u32>) {
        let file = task.name().to_string();
        let content_type = task.metadata.content_type.clone();

        let mut transfers = stream::iter(indices.iter().copied())
            .map(|index| {
                let chunk = chunked.chunks.get(index as usize);
                let target = session.target(index);
                let content_type = content_type.as_str();
                async move {
                    let result = match (chunk, target) {
                        (Some(chunk), Some(target)) => self
                            .store
                            .transfer_chunk(target, &chunk.data, content_type)
                            .await
                            .map(|()| chunk.len()),
                        _ => Err(UploadError::ChunkTransfer {
                            index,
                            message: "no data or target for chunk".into(),
                        }),
                    };
                    (index, result)
                }
            })
            .buffer_unordered(self.config.upload_concurrency);

        let mut done = Vec::with_capacity(indices.len());
        let mut failed = Vec::new();

        while let Some((index, result)) = transfers.next().await {
            match result {
                Ok(len) => {
                    let transferred = counter.add(len);
                    task.set_progress(counter.percent());
                    self.emit(UploadEvent::Progress {
                        file: file.clone(),
                        percent: task.progress(),
                        transferred,
                        total: counter.total(),
                    });
                    done.push(index);
                }
                Err(e) => {
                    warn!(file = %file, index, attempt, error = %e, "chunk transfer failed");
                    self.emit(UploadEvent::ChunkFailed {
                        file: file.clone(),
                        index,
                        attempt,
                        error: e.to_string(),
                    });
                    failed.push(index);
                }
            }
        }

        failed.sort_unstable();
        (done, failed)
    }

    fn complete(&self, task: &mut UploadTask) -> Result<(), UploadError> {
        task.set_progress(100);
        self.set_status(task, TransferStatus::Success)
    }

    fn set_status(&self, task: &mut UploadTask, status: TransferStatus) -> Result<(), UploadError> {
        task.set_status(status)?;
        self.emit_status(task);
        Ok(())
    }

    fn emit_status(&self, task: &UploadTask) {
        self.emit(UploadEvent::StatusChanged {
            file: task.name().to_string(),
            status: task.status(),
        });
    }

    fn emit(&self, event: UploadEvent) {
        // A full or closed channel only drops the event.
        let _ = self.events_tx.try_send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreFuture;
    use slicedrop_transfer::ContentId;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory store. Targets are `"{content hex}/{index}"`.
    #[derive(Default)]
    struct MockStore {
        stored: Mutex<HashSet<ContentId>>,
        parts: Mutex<HashMap<ContentId, BTreeSet<u32>>>,
        transfers: Mutex<Vec<u32>>,
        finalized: Mutex<Vec<ContentId>>,
        /// Remaining forced failures per chunk index.
        failures: Mutex<HashMap<u32, u32>>,
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MockStore {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn fail_chunk(&self, index: u32, times: u32) {
            self.failures.lock().unwrap().insert(index, times);
        }

        fn seed_parts(&self, content_id: ContentId, parts: &[u32]) {
            self.parts
                .lock()
                .unwrap()
                .insert(content_id, parts.iter().copied().collect());
        }

        fn transfers(&self) -> Vec<u32> {
            let mut t = self.transfers.lock().unwrap().clone();
            t.sort_unstable();
            t
        }

        fn finalize_count(&self) -> usize {
            self.finalized.lock().unwrap().len()
        }
    }

    impl ContentStore for MockStore {
        fn lookup<'a>(&'a self, content_id: &'a ContentId) -> StoreFuture<'a, DedupLookup> {
            Box::pin(async move {
                if self.stored.lock().unwrap().contains(content_id) {
                    return Ok(DedupLookup::Exists);
                }
                match self.parts.lock().unwrap().get(content_id) {
                    Some(parts) if !parts.is_empty() => Ok(DedupLookup::InProgress {
                        session_id: format!("s-{}", content_id.to_hex()),
                        uploaded: parts.clone(),
                    }),
                    _ => Ok(DedupLookup::Missing),
                }
            })
        }

        fn negotiate<'a>(
            &'a self,
            request: &'a SessionRequest,
        ) -> StoreFuture<'a, UploadSession> {
            Box::pin(async move {
                let hex = request.content_id.to_hex();
                Ok(UploadSession {
                    session_id: request
                        .resume_session
                        .clone()
                        .unwrap_or_else(|| format!("s-{hex}")),
                    content_id: request.content_id,
                    chunk_count: request.chunk_count,
                    chunk_size: request.chunk_size,
                    targets: (0..request.chunk_count)
                        .map(|i| format!("{hex}/{i}"))
                        .collect(),
                    uploaded: BTreeSet::new(),
                })
            })
        }

        fn transfer_chunk<'a>(
            &'a self,
            target: &'a str,
            _data: &'a [u8],
            _content_type: &'a str,
        ) -> StoreFuture<'a, ()> {
            Box::pin(async move {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                self.in_flight.fetch_sub(1, Ordering::SeqCst);

                let (hex, index) = target
                    .rsplit_once('/')
                    .ok_or_else(|| UploadError::Store(format!("bad target {target}")))?;
                let index: u32 = index
                    .parse()
                    .map_err(|_| UploadError::Store(format!("bad target {target}")))?;
                let content_id = ContentId::from_hex(hex)
                    .map_err(|e| UploadError::Store(e.to_string()))?;

                if let Some(left) = self.failures.lock().unwrap().get_mut(&index)
                    && *left > 0
                {
                    *left -= 1;
                    return Err(UploadError::ChunkTransfer {
                        index,
                        message: "connection reset".into(),
                    });
                }

                self.transfers.lock().unwrap().push(index);
                self.parts
                    .lock()
                    .unwrap()
                    .entry(content_id)
                    .or_default()
                    .insert(index);
                Ok(())
            })
        }

        fn finalize<'a>(&'a self, content_id: &'a ContentId) -> StoreFuture<'a, ()> {
            Box::pin(async move {
                self.finalized.lock().unwrap().push(*content_id);
                self.parts.lock().unwrap().remove(content_id);
                self.stored.lock().unwrap().insert(*content_id);
                Ok(())
            })
        }
    }

    fn config(chunk_size: u64) -> TransferConfig {
        TransferConfig {
            chunk_size,
            ..TransferConfig::default()
        }
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    async fn prepared(coord: &UploadCoordinator<'_>, name: &str, data: Vec<u8>) -> UploadTask {
        coord
            .prepare_bytes(FileMetadata::new(name, 0), data)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn upload_sends_every_chunk_then_finalizes() {
        let store = MockStore::default();
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let mut task = prepared(&coord, "a.bin", payload(10)).await;
        assert_eq!(task.status(), TransferStatus::PendingTransfer);
        assert_eq!(task.metadata.size, 10);

        let report = coord.upload(&mut task).await.unwrap();
        assert!(!report.deduplicated);
        assert_eq!(report.transferred_chunks, 3);
        assert_eq!(report.resumed_chunks, 0);
        assert_eq!(Some(report.content_id), task.content_id());
        assert_eq!(store.transfers(), vec![0, 1, 2]);
        assert_eq!(store.finalize_count(), 1);
        assert_eq!(task.status(), TransferStatus::Success);
        assert_eq!(task.progress(), 100);
    }

    #[tokio::test]
    async fn second_upload_of_same_content_transfers_nothing() {
        let store = MockStore::default();
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();

        let mut first = prepared(&coord, "a.bin", payload(10)).await;
        coord.upload(&mut first).await.unwrap();
        let sent = store.transfers().len();

        let mut second = prepared(&coord, "copy.bin", payload(10)).await;
        let report = coord.upload(&mut second).await.unwrap();

        assert!(report.deduplicated);
        assert_eq!(report.transferred_chunks, 0);
        assert_eq!(store.transfers().len(), sent);
        assert_eq!(store.finalize_count(), 1);
        assert_eq!(second.status(), TransferStatus::Success);
        assert_eq!(second.progress(), 100);
    }

    #[tokio::test]
    async fn resume_transfers_only_missing_chunks() {
        let store = MockStore::default();
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let mut task = prepared(&coord, "a.bin", payload(20)).await;
        store.seed_parts(task.content_id().unwrap(), &[0, 2]);

        let report = coord.upload(&mut task).await.unwrap();

        assert_eq!(report.resumed_chunks, 2);
        assert_eq!(report.transferred_chunks, 3);
        assert_eq!(store.transfers(), vec![1, 3, 4]);
        assert_eq!(store.finalize_count(), 1);
    }

    #[tokio::test]
    async fn failed_chunk_fails_upload_without_finalize() {
        let store = MockStore::default();
        store.fail_chunk(1, 1);
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let mut task = prepared(&coord, "a.bin", payload(12)).await;

        let err = coord.upload(&mut task).await.unwrap_err();

        assert!(matches!(
            err,
            UploadError::BatchFailed {
                failed: 1,
                attempts: 1
            }
        ));
        assert_eq!(task.status(), TransferStatus::Error);
        assert_eq!(store.finalize_count(), 0);
        assert_eq!(store.transfers(), vec![0, 2]);
    }

    #[tokio::test]
    async fn upload_after_error_resumes_remaining_chunks() {
        let store = MockStore::default();
        store.fail_chunk(1, 1);
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let mut task = prepared(&coord, "a.bin", payload(12)).await;

        assert!(coord.upload(&mut task).await.is_err());
        let report = coord.upload(&mut task).await.unwrap();

        assert_eq!(report.resumed_chunks, 2);
        assert_eq!(report.transferred_chunks, 1);
        assert_eq!(store.transfers(), vec![0, 1, 2]);
        assert_eq!(store.finalize_count(), 1);
        assert_eq!(task.status(), TransferStatus::Success);
    }

    #[tokio::test]
    async fn retry_rounds_recover_failed_chunks() {
        let store = MockStore::default();
        store.fail_chunk(0, 2);
        let cfg = TransferConfig {
            max_chunk_attempts: 3,
            ..config(4)
        };
        let mut coord = UploadCoordinator::new(&store, cfg).unwrap();
        let mut events = coord.take_events().unwrap();
        let mut task = prepared(&coord, "a.bin", payload(12)).await;

        let report = coord.upload(&mut task).await.unwrap();
        assert_eq!(report.transferred_chunks, 3);
        assert_eq!(store.finalize_count(), 1);

        let mut failures = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let UploadEvent::ChunkFailed { index, attempt, .. } = event {
                failures.push((index, attempt));
            }
        }
        assert_eq!(failures, vec![(0, 1), (0, 2)]);
    }

    #[tokio::test]
    async fn out_of_range_uploaded_index_is_rejected() {
        let store = MockStore::default();
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let mut task = prepared(&coord, "a.bin", payload(12)).await;
        store.seed_parts(task.content_id().unwrap(), &[9]);

        let err = coord.upload(&mut task).await.unwrap_err();

        assert!(matches!(
            err,
            UploadError::Transfer(TransferError::Validation(_))
        ));
        assert_eq!(task.status(), TransferStatus::Error);
        assert!(store.transfers().is_empty());
        assert_eq!(store.finalize_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_transfers_respect_limit() {
        let store = MockStore::with_delay(Duration::from_millis(10));
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let mut task = prepared(&coord, "a.bin", payload(48)).await;

        coord.upload(&mut task).await.unwrap();

        let peak = store.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {peak} exceeds limit");
        assert!(peak > 1, "transfers never overlapped");
        assert_eq!(store.transfers().len(), 12);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_100() {
        let store = MockStore::with_delay(Duration::from_millis(1));
        let mut coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let mut events = coord.take_events().unwrap();
        let mut task = prepared(&coord, "a.bin", payload(30)).await;

        coord.upload(&mut task).await.unwrap();

        let mut last = 0u8;
        let mut last_transferred = 0u64;
        while let Ok(event) = events.try_recv() {
            if let UploadEvent::Progress {
                percent,
                transferred,
                total,
                ..
            } = event
            {
                assert!(percent >= last, "progress went back: {last} -> {percent}");
                assert!(transferred > last_transferred);
                assert_eq!(total, 30);
                last = percent;
                last_transferred = transferred;
            }
        }
        assert_eq!(last, 100);
        assert_eq!(last_transferred, 30);
    }

    #[tokio::test]
    async fn empty_file_finalizes_without_transfers() {
        let store = MockStore::default();
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let mut task = prepared(&coord, "empty.bin", Vec::new()).await;

        let report = coord.upload(&mut task).await.unwrap();

        assert_eq!(report.transferred_chunks, 0);
        assert!(store.transfers().is_empty());
        assert_eq!(store.finalize_count(), 1);
        assert_eq!(task.status(), TransferStatus::Success);
    }

    #[tokio::test]
    async fn unprepared_task_is_rejected() {
        let store = MockStore::default();
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let mut task = UploadTask::new(FileMetadata::new("a.bin", 3));

        let err = coord.upload(&mut task).await.unwrap_err();
        assert!(matches!(err, UploadError::NotPrepared(_)));
        assert_eq!(task.status(), TransferStatus::Preparing);
    }

    #[tokio::test]
    async fn upload_all_skips_unprepared_files() {
        let store = MockStore::default();
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let mut tasks = vec![
            prepared(&coord, "a.bin", payload(9)).await,
            UploadTask::new(FileMetadata::new("b.bin", 3)),
            prepared(&coord, "c.bin", b"different".to_vec()).await,
        ];

        let results = coord.upload_all(&mut tasks).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(results[0].file, "a.bin");
        assert_eq!(results[1].file, "c.bin");
        assert_eq!(tasks[1].status(), TransferStatus::Preparing);
        assert_eq!(store.finalize_count(), 2);
    }

    #[tokio::test]
    async fn upload_all_reports_failures_and_continues() {
        let store = MockStore::default();
        store.fail_chunk(0, 1);
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let mut tasks = vec![
            prepared(&coord, "a.bin", payload(9)).await,
            prepared(&coord, "b.bin", payload(3)).await,
        ];

        let results = coord.upload_all(&mut tasks).await;

        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[0].error.is_some());
        // The injected failure was consumed by the first file.
        assert!(results[1].success);
    }

    #[tokio::test]
    async fn prepare_file_matches_prepare_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, payload(10)).unwrap();

        let store = MockStore::default();
        let coord = UploadCoordinator::new(&store, config(4)).unwrap();
        let from_disk = coord.prepare_file(&path, Some("image/jpeg")).await.unwrap();
        let in_memory = prepared(&coord, "photo.jpg", payload(10)).await;

        assert_eq!(from_disk.name(), "photo.jpg");
        assert_eq!(from_disk.metadata.size, 10);
        assert_eq!(from_disk.metadata.content_type, "image/jpeg");
        assert_eq!(from_disk.chunked().unwrap().chunk_count(), 3);
        assert_eq!(from_disk.content_id(), in_memory.content_id());
        assert_eq!(from_disk.status(), TransferStatus::PendingTransfer);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let store = MockStore::default();
        let cfg = TransferConfig {
            upload_concurrency: 0,
            ..TransferConfig::default()
        };
        assert!(UploadCoordinator::new(&store, cfg).is_err());
    }

    #[tokio::test]
    async fn take_events_once() {
        let store = MockStore::default();
        let mut coord = UploadCoordinator::new(&store, config(4)).unwrap();
        assert!(coord.take_events().is_some());
        assert!(coord.take_events().is_none());
    }
}
