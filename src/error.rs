//! Error types for the upload and storage service.

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, UploadError>;

/// Upload and storage errors.
///
/// Duplicate chunk delivery and losing the completion race are not errors;
/// both are ordinary outcomes reported in [`ChunkReceipt`].
///
/// [`ChunkReceipt`]: crate::upload::ChunkReceipt
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid session token: {0:?}")]
    InvalidSessionToken(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already completed: {0}")]
    SessionCompleted(String),

    #[error("Invalid chunk count: {0}")]
    InvalidChunkCount(u32),

    #[error("Chunk index {index} out of bounds (total: {total})")]
    ChunkIndexOutOfBounds { index: u32, total: u32 },

    #[error("Missing chunk {index}, cannot assemble")]
    MissingChunk { index: u32 },

    #[error("File too large: {size} bytes (max: {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Unsupported media type for public storage: {0}")]
    UnsupportedMediaType(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),
}
