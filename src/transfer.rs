//! Segmented concurrent transfer engine.
//!
//! Downloads one remote file of known size as several parallel byte-range
//! requests into a preallocated destination file. Chunk writes land at
//! disjoint offsets, so the workers only synchronize on two things: a shared
//! progress counter and a write-once error latch. The first worker to fail
//! installs its error in the latch; the others notice during their read loop
//! and abandon. A failed transfer always deletes the partial file; a
//! half-written artifact is never reported as success.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use futures_util::StreamExt;
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use tokio::io::{AsyncSeekExt, AsyncWriteExt, SeekFrom};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Default number of parallel range workers per transfer
pub const DEFAULT_WORKERS: usize = 4;

/// Errors surfaced by the transfer engine
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Request failed, bad status, or the body stream broke mid-read
    #[error("transport error: {0}")]
    Transport(String),

    /// Destination file error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Advisory progress callback receiving cumulative bytes transferred.
///
/// The sink is best-effort: panics inside it are caught, and nothing it does
/// can fail the transfer.
pub type ProgressSink = Arc<dyn Fn(u64) + Send + Sync>;

/// An inclusive byte range handled by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chunk {
    start: u64,
    end: u64,
}

impl Chunk {
    fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Partition `[0, declared_size)` into at most `workers` contiguous chunks.
///
/// Each chunk gets `declared_size / workers` bytes; the division remainder is
/// appended to the last chunk. Chunks that would be empty (sizes smaller than
/// the worker count) are dropped, so the returned ranges always cover the
/// interval exactly once with no gaps or overlaps.
fn plan_chunks(declared_size: u64, workers: usize) -> Vec<Chunk> {
    let workers = workers.max(1) as u64;
    let block = declared_size / workers;

    let mut chunks = Vec::with_capacity(workers as usize);
    for i in 0..workers {
        let start = i * block;
        let end = if i == workers - 1 {
            declared_size
        } else {
            (i + 1) * block
        };
        if end > start {
            chunks.push(Chunk {
                start,
                end: end - 1,
            });
        }
    }
    chunks
}

/// State shared by all workers of one transfer
struct TransferShared {
    client: Client,
    url: String,
    token: Option<String>,
    dest: PathBuf,
    /// Cumulative bytes received across all workers
    transferred: AtomicU64,
    progress: Option<ProgressSink>,
    /// Write-once first-error latch; flag and payload install as one unit
    latch: OnceLock<TransferError>,
    /// Serializes sync-to-disk calls
    sync_lock: Mutex<()>,
}

/// Segmented transfer engine.
///
/// One engine can run many transfers; each `transfer` call is self-contained
/// and blocks until all of its workers have joined.
#[derive(Clone)]
pub struct TransferEngine {
    client: Client,
    token: Option<String>,
    workers: usize,
    progress: Option<ProgressSink>,
}

impl TransferEngine {
    /// Create an engine using the given HTTP client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            token: None,
            workers: DEFAULT_WORKERS,
            progress: None,
        }
    }

    /// Attach a bearer token to every range request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the number of parallel workers (minimum 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Attach an advisory progress sink. Panics from the sink are caught and
    /// ignored.
    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Download `url` into `dest`, which is preallocated to `declared_size`
    /// bytes before any data arrives.
    ///
    /// On success returns `dest`; on any worker failure the partial file is
    /// deleted and the first-observed error is returned.
    pub async fn transfer(
        &self,
        url: &str,
        dest: &Path,
        declared_size: u64,
    ) -> Result<PathBuf, TransferError> {
        let file = tokio::fs::File::create(dest).await?;
        if let Err(err) = file.set_len(declared_size).await {
            drop(file);
            remove_dest(dest).await;
            return Err(err.into());
        }
        drop(file);

        let chunks = plan_chunks(declared_size, self.workers);
        tracing::debug!(
            url,
            declared_size,
            chunks = chunks.len(),
            "starting segmented transfer"
        );

        let shared = Arc::new(TransferShared {
            client: self.client.clone(),
            url: url.to_string(),
            token: self.token.clone(),
            dest: dest.to_path_buf(),
            transferred: AtomicU64::new(0),
            progress: self.progress.clone(),
            latch: OnceLock::new(),
            sync_lock: Mutex::new(()),
        });

        let mut workers = JoinSet::new();
        for chunk in chunks {
            let shared = Arc::clone(&shared);
            workers.spawn(async move {
                if let Err(err) = fetch_chunk(&shared, chunk).await {
                    // First error wins; later failures are dropped.
                    let _ = shared.latch.set(err);
                }
            });
        }

        // Join barrier: all writes are durable before success is reported.
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                let _ = shared
                    .latch
                    .set(TransferError::Transport(format!("worker task failed: {}", err)));
            }
        }

        let latched = match Arc::try_unwrap(shared) {
            Ok(shared) => shared.latch.into_inner(),
            // All workers have joined, so this arm is not expected; keep the
            // error rather than lose it.
            Err(shared) => shared
                .latch
                .get()
                .map(|err| TransferError::Transport(err.to_string())),
        };

        if let Some(err) = latched {
            remove_dest(dest).await;
            return Err(err);
        }

        Ok(dest.to_path_buf())
    }
}

/// Remove the destination file after a failure, logging if that fails too.
async fn remove_dest(dest: &Path) {
    if let Err(err) = tokio::fs::remove_file(dest).await {
        tracing::warn!(dest = %dest.display(), error = %err, "failed to remove partial file");
    }
}

impl std::fmt::Debug for TransferEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine")
            .field("workers", &self.workers)
            .field("has_token", &self.token.is_some())
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}

/// Fetch one chunk and write it at its offset.
async fn fetch_chunk(shared: &TransferShared, chunk: Chunk) -> Result<(), TransferError> {
    let mut request = shared
        .client
        .get(&shared.url)
        .header(RANGE, format!("bytes={}-{}", chunk.start, chunk.end));
    if let Some(token) = &shared.token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await.map_err(|e| {
        TransferError::Transport(format!("range {}-{}: {}", chunk.start, chunk.end, e))
    })?;

    let status = response.status();
    if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
        return Err(TransferError::Transport(format!(
            "range {}-{} returned status {}",
            chunk.start, chunk.end, status
        )));
    }

    let mut buffer = Vec::with_capacity(chunk.len() as usize);
    let mut body = response.bytes_stream();

    while let Some(piece) = body.next().await {
        // Another worker already failed; abandon without installing an error.
        if shared.latch.get().is_some() {
            return Ok(());
        }

        let piece = piece.map_err(|e| {
            TransferError::Transport(format!("range {}-{}: {}", chunk.start, chunk.end, e))
        })?;
        buffer.extend_from_slice(&piece);

        let total = shared
            .transferred
            .fetch_add(piece.len() as u64, Ordering::Relaxed)
            + piece.len() as u64;
        if let Some(sink) = &shared.progress {
            // A misbehaving sink must not take the transfer down with it.
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink(total)));
        }
    }

    // Writes never overlap byte ranges, so no lock is needed for the write
    // itself; only the sync calls are serialized.
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .open(&shared.dest)
        .await?;
    file.seek(SeekFrom::Start(chunk.start)).await?;
    file.write_all(&buffer).await?;

    let _guard = shared.sync_lock.lock().await;
    file.sync_data().await?;

    Ok(())
}
