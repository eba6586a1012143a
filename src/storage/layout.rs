//! On-disk layout of uploads and temporary chunks.

use uuid::Uuid;

use crate::error::Result;
use super::mime::file_extension;
use super::path::{Area, StoragePath};

/// Directory holding a session's temporary chunks.
pub(crate) fn chunk_dir(token: &str) -> Result<StoragePath> {
    StoragePath::private(format!("tmp/chunks/{token}"))
}

/// Chunk file for (session, index). Zero-padded so directory listings sort
/// in index order.
pub(crate) fn chunk_file(token: &str, index: u32) -> Result<StoragePath> {
    StoragePath::private(format!("tmp/chunks/{token}/{index:08}.chunk"))
}

/// Destination for a stored file: a fresh UUID carrying the original
/// extension, under the owner's per-category directory.
pub(crate) fn artifact_file(
    area: Area,
    user_id: i64,
    category: &str,
    file_name: &str,
) -> Result<StoragePath> {
    let id = Uuid::new_v4();
    let stored_name = match file_extension(file_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    };
    StoragePath::new(area, format!("uploads/{user_id}/{category}/{stored_name}"))
}
