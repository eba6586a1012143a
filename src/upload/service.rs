//! Upload service facade
//!
//! Ties the session registry, blob store, and file records together into
//! the operations callers use: chunked receive, progress queries, whole-file
//! stores, duplicate lookup, cancellation, and idle-session sweeping.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::{self, FileRecord, FileRepository, NewFile};
use crate::error::{Result, UploadError};
use crate::hash;
use crate::storage::{layout, mime, Area, BlobStore, DiskStore};
use super::assembler;
use super::session::{Admission, Commit, SessionRegistry};
use super::types::{ChunkReceipt, ChunkUpload, StoreRequest, UploadProgress};

/// Coordinates chunked uploads, whole-file uploads, and session cleanup
#[derive(Clone)]
pub struct UploadService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    /// Blob storage backend
    store: Arc<dyn BlobStore>,

    /// Database pool for file records
    pool: SqlitePool,

    /// In-flight chunked sessions
    registry: SessionRegistry,

    /// Maximum accepted file size in bytes
    max_file_size: u64,

    /// Idle time after which a session is swept
    idle_timeout: Duration,

    /// Interval between background sweeps
    sweep_interval: Duration,
}

impl UploadService {
    /// Create a service backed by local disk storage
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(&config.database.url).await?;
        let store = Arc::new(DiskStore::new(config.storage.root.clone()));
        Ok(Self::with_parts(store, pool, config))
    }

    /// Create a service over an existing store and pool
    pub fn with_parts(store: Arc<dyn BlobStore>, pool: SqlitePool, config: &Config) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                store,
                pool,
                registry: SessionRegistry::new(),
                max_file_size: config.upload.max_file_size,
                idle_timeout: Duration::from_secs(config.upload.session_idle_timeout_secs),
                sweep_interval: Duration::from_secs(config.upload.sweep_interval_secs),
            }),
        }
    }

    // ========================================================================
    // Chunked Upload
    // ========================================================================

    /// Receive one chunk of a chunked upload.
    ///
    /// The first chunk naming a token creates the session; chunks arrive in
    /// any order and re-sent indices are acknowledged without effect. The
    /// call that lands the final missing chunk assembles the file and
    /// returns the stored record in its receipt.
    pub async fn receive_chunk(&self, chunk: ChunkUpload) -> Result<ChunkReceipt> {
        if chunk.declared_size > self.inner.max_file_size {
            return Err(UploadError::FileTooLarge {
                size: chunk.declared_size,
                max: self.inner.max_file_size,
            });
        }

        match self.inner.registry.admit(&chunk).await? {
            Admission::Duplicate { received, total } => {
                return Ok(ChunkReceipt {
                    received,
                    total,
                    duplicate: true,
                    completed: None,
                });
            }
            Admission::Accept => {}
        }

        // Bytes land on disk before the index is committed, so a full
        // bitmap always implies a full chunk directory.
        let path = layout::chunk_file(&chunk.token, chunk.index)?;
        self.inner.store.write(&path, &chunk.data).await?;

        match self.inner.registry.commit(&chunk.token, chunk.index).await? {
            Commit::Progress { received, total } => Ok(ChunkReceipt {
                received,
                total,
                duplicate: false,
                completed: None,
            }),
            Commit::Duplicate { received, total } => Ok(ChunkReceipt {
                received,
                total,
                duplicate: true,
                completed: None,
            }),
            Commit::Assemble(job) => {
                let total = job.total_chunks;
                match assembler::assemble(self.inner.store.as_ref(), &self.inner.pool, &job).await
                {
                    Ok(record) => {
                        self.inner
                            .registry
                            .finalize(
                                &job.token,
                                record.stored_path.clone(),
                                record.content_hash.clone(),
                            )
                            .await;
                        Ok(ChunkReceipt {
                            received: total,
                            total,
                            duplicate: false,
                            completed: Some(record),
                        })
                    }
                    Err(e) => {
                        self.inner.registry.fail(&job.token).await;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Progress of an in-flight or finished session, if the token is known
    pub async fn progress(&self, token: &str) -> Option<UploadProgress> {
        self.inner.registry.progress(token).await
    }

    /// Cancel a session and discard its stored chunks
    pub async fn cancel(&self, token: &str) -> Result<()> {
        self.inner.registry.cancel(token).await?;

        let chunk_dir = layout::chunk_dir(token)?;
        self.inner.store.delete_dir(&chunk_dir).await?;

        Ok(())
    }

    // ========================================================================
    // Whole-File Upload
    // ========================================================================

    /// Store a complete file in one call.
    ///
    /// Public-area uploads are limited to embeddable media types; anything
    /// else must go to the private area.
    pub async fn store_file(&self, request: StoreRequest) -> Result<FileRecord> {
        let size = request.data.len() as u64;
        if size > self.inner.max_file_size {
            return Err(UploadError::FileTooLarge {
                size,
                max: self.inner.max_file_size,
            });
        }

        let mime_type = mime::resolve_mime(request.mime_type.as_deref(), &request.file_name);
        if request.area == Area::Public && !mime::is_public_type(&mime_type) {
            return Err(UploadError::UnsupportedMediaType(mime_type));
        }

        let dest = layout::artifact_file(
            request.area,
            request.user_id,
            &request.category,
            &request.file_name,
        )?;
        self.inner.store.write(&dest, &request.data).await?;

        let content_hash = hash::hash_bytes(&request.data);

        let created = FileRepository::new(&self.inner.pool)
            .create(NewFile {
                user_id: request.user_id,
                file_name: request.file_name,
                stored_path: dest.to_internal(),
                mime_type,
                size: size as i64,
                content_hash,
                category: request.category,
                related_id: request.related_id,
            })
            .await;

        match created {
            Ok(record) => {
                tracing::info!(
                    file_id = %record.id,
                    user_id = record.user_id,
                    size = size,
                    "Stored file"
                );
                Ok(record)
            }
            Err(e) => {
                let _ = self.inner.store.delete(&dest).await;
                Err(e)
            }
        }
    }

    /// Earliest completed record with the given content hash, if any
    pub async fn find_duplicate(&self, content_hash: &str) -> Result<Option<FileRecord>> {
        let record = FileRepository::new(&self.inner.pool)
            .find_by_hash(content_hash)
            .await?;

        if let Some(existing) = &record {
            tracing::debug!(
                content_hash = %content_hash,
                file_id = %existing.id,
                "Duplicate content found"
            );
        }

        Ok(record)
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    /// Sweep sessions idle past the configured timeout, removing their
    /// chunk directories. Returns the number of sessions removed.
    pub async fn sweep_idle(&self) -> usize {
        let removed = self.inner.registry.sweep_idle(self.inner.idle_timeout).await;

        for token in &removed {
            if let Ok(chunk_dir) = layout::chunk_dir(token) {
                if let Err(e) = self.inner.store.delete_dir(&chunk_dir).await {
                    tracing::warn!(token = %token, error = %e, "Failed to remove chunk directory");
                }
            }
        }

        removed.len()
    }

    /// Start the background task that periodically sweeps idle sessions
    pub fn start_sweep_task(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.inner.sweep_interval);

            loop {
                interval.tick().await;
                self.sweep_idle().await;
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
