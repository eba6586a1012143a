//! File assembly for completed chunk sets
//!
//! Concatenates chunks in index order into a private artifact, checksums
//! it, and records it in the database. The temporary chunk directory is
//! removed whether assembly succeeds or fails.

use sqlx::SqlitePool;

use crate::db::{FileRecord, FileRepository, NewFile};
use crate::error::{Result, UploadError};
use crate::storage::{layout, Area, BlobStore, StoragePath};
use super::session::AssemblyJob;
use super::types::CHUNKED_CATEGORY;

/// Assemble a session whose every chunk has been committed.
pub(crate) async fn assemble(
    store: &dyn BlobStore,
    pool: &SqlitePool,
    job: &AssemblyJob,
) -> Result<FileRecord> {
    let result = run(store, pool, job).await;

    if let Ok(chunk_dir) = layout::chunk_dir(&job.token) {
        if let Err(e) = store.delete_dir(&chunk_dir).await {
            tracing::warn!(token = %job.token, error = %e, "Failed to remove chunk directory");
        }
    }

    result
}

async fn run(store: &dyn BlobStore, pool: &SqlitePool, job: &AssemblyJob) -> Result<FileRecord> {
    tracing::debug!(
        token = %job.token,
        total_chunks = job.total_chunks,
        "Assembling chunked upload"
    );

    // Verify the full set is on disk before creating the destination, so a
    // gap surfaces as a precise error instead of a half-written artifact.
    let mut sources = Vec::with_capacity(job.total_chunks as usize);
    for index in 0..job.total_chunks {
        let path = layout::chunk_file(&job.token, index)?;
        if !store.exists(&path).await {
            return Err(UploadError::MissingChunk { index });
        }
        sources.push(path);
    }

    let dest = layout::artifact_file(Area::Private, job.user_id, CHUNKED_CATEGORY, &job.file_name)?;

    match write_artifact(store, pool, job, &sources, &dest).await {
        Ok(record) => Ok(record),
        Err(e) => {
            // Do not leave a partial artifact behind.
            let _ = store.delete(&dest).await;
            Err(e)
        }
    }
}

async fn write_artifact(
    store: &dyn BlobStore,
    pool: &SqlitePool,
    job: &AssemblyJob,
    sources: &[StoragePath],
    dest: &StoragePath,
) -> Result<FileRecord> {
    let size = store.concat(sources, dest).await?;
    let content_hash = store.checksum(dest).await?;

    let record = FileRepository::new(pool)
        .create(NewFile {
            user_id: job.user_id,
            file_name: job.file_name.clone(),
            stored_path: dest.to_internal(),
            mime_type: job.mime_type.clone(),
            size: size as i64,
            content_hash,
            category: CHUNKED_CATEGORY.to_string(),
            related_id: None,
        })
        .await?;

    tracing::info!(
        token = %job.token,
        file_id = %record.id,
        size = size,
        "Assembled chunked upload"
    );

    Ok(record)
}
