//! Types for the chunked upload pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::FileRecord;
use crate::error::{Result, UploadError};
use crate::storage::mime;
use super::bitmap::ChunkBitmap;

// ============================================================================
// Constants
// ============================================================================

/// Maximum accepted session token length
pub const MAX_TOKEN_LEN: usize = 128;

/// Maximum chunks one upload may declare. The declared count sizes the
/// per-session bitmap and the missing-index reports, so it is capped before
/// any allocation happens.
pub const MAX_CHUNK_COUNT: u32 = 10_000;

/// Category recorded for files that arrive through the chunked pipeline
pub const CHUNKED_CATEGORY: &str = "chunked";

/// Validate a caller-supplied session token.
///
/// Tokens double as directory names under the temporary chunk root, so the
/// accepted alphabet is restricted to filesystem-safe characters.
pub fn validate_token(token: &str) -> Result<()> {
    let ok = !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if ok {
        Ok(())
    } else {
        Err(UploadError::InvalidSessionToken(token.to_string()))
    }
}

// ============================================================================
// Chunk Upload Types
// ============================================================================

/// One chunk of a client-driven chunked upload
#[derive(Debug, Clone)]
pub struct ChunkUpload {
    /// Caller-supplied session token; every chunk of one file shares it
    pub token: String,

    /// Uploading user
    pub user_id: i64,

    /// Zero-based index of this chunk
    pub index: u32,

    /// Total number of chunks the client will send
    pub total_chunks: u32,

    /// Original file name
    pub file_name: String,

    /// Declared MIME type, if the client sent one
    pub mime_type: Option<String>,

    /// Declared size of the complete file in bytes
    pub declared_size: u64,

    /// Chunk payload
    pub data: Vec<u8>,
}

/// Outcome of storing one chunk
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkReceipt {
    /// Distinct chunk indices received so far
    pub received: u32,

    /// Total chunks expected
    pub total: u32,

    /// Whether this index had been received before
    pub duplicate: bool,

    /// Set when this chunk completed the file and assembly succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<FileRecord>,
}

// ============================================================================
// Whole-File Upload Types
// ============================================================================

/// A whole file handed over in a single call
#[derive(Debug, Clone)]
pub struct StoreRequest {
    /// Uploading user
    pub user_id: i64,

    /// Original file name
    pub file_name: String,

    /// Declared MIME type, if the client sent one
    pub mime_type: Option<String>,

    /// Caller-chosen grouping, e.g. "avatars" or "course-materials"
    pub category: String,

    /// Optional ID of the entity this file belongs to
    pub related_id: Option<i64>,

    /// Target storage area
    pub area: crate::storage::Area,

    /// Complete file payload
    pub data: Vec<u8>,
}

// ============================================================================
// Session Types
// ============================================================================

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Accepting chunks
    Receiving,
    /// All chunks received, assembly in progress
    Assembling,
    /// File assembled and recorded
    Completed,
    /// Assembly failed; the token may be reused
    Failed,
}

/// In-memory state of one chunked upload
#[derive(Debug, Clone)]
pub struct UploadSession {
    /// Session token
    pub token: String,

    /// Uploading user
    pub user_id: i64,

    /// Original file name
    pub file_name: String,

    /// Resolved MIME type
    pub mime_type: String,

    /// Declared size of the complete file in bytes
    pub declared_size: u64,

    /// Indices received so far
    pub received: ChunkBitmap,

    /// Current status
    pub status: SessionStatus,

    /// Session creation time
    pub created_at: DateTime<Utc>,

    /// Time of the most recent accepted chunk
    pub last_activity: DateTime<Utc>,

    /// Storage path of the assembled file, once completed
    pub stored_path: Option<String>,

    /// Content hash of the assembled file, once completed
    pub content_hash: Option<String>,
}

impl UploadSession {
    /// Create a session from the first chunk that names its token
    pub fn new(chunk: &ChunkUpload) -> Self {
        let now = Utc::now();

        Self {
            token: chunk.token.clone(),
            user_id: chunk.user_id,
            file_name: chunk.file_name.clone(),
            mime_type: mime::resolve_mime(chunk.mime_type.as_deref(), &chunk.file_name),
            declared_size: chunk.declared_size,
            received: ChunkBitmap::new(chunk.total_chunks),
            status: SessionStatus::Receiving,
            created_at: now,
            last_activity: now,
            stored_path: None,
            content_hash: None,
        }
    }

    /// Record activity on this session
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Whether the session saw no activity since `cutoff`
    pub fn idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_activity < cutoff
    }

    /// Snapshot for the interrupted-upload query
    pub fn progress(&self) -> UploadProgress {
        UploadProgress {
            token: self.token.clone(),
            file_name: self.file_name.clone(),
            status: self.status,
            received: self.received.count(),
            total: self.received.len(),
            missing: self.received.missing(),
            created_at: self.created_at,
            stored_path: self.stored_path.clone(),
            content_hash: self.content_hash.clone(),
        }
    }
}

/// Snapshot of an in-flight or finished session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    /// Session token
    pub token: String,

    /// Original file name
    pub file_name: String,

    /// Current status
    pub status: SessionStatus,

    /// Distinct chunk indices received so far
    pub received: u32,

    /// Total chunks expected
    pub total: u32,

    /// Indices still needed, in ascending order
    pub missing: Vec<u32>,

    /// Session creation time
    pub created_at: DateTime<Utc>,

    /// Storage path of the assembled file, once completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_path: Option<String>,

    /// Content hash of the assembled file, once completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(token: &str) -> ChunkUpload {
        ChunkUpload {
            token: token.to_string(),
            user_id: 1,
            index: 0,
            total_chunks: 3,
            file_name: "slides.pdf".to_string(),
            mime_type: None,
            declared_size: 300,
            data: vec![0u8; 100],
        }
    }

    #[test]
    fn token_alphabet_is_enforced() {
        assert!(validate_token("abc-DEF_123").is_ok());
        assert!(validate_token(&"x".repeat(MAX_TOKEN_LEN)).is_ok());

        assert!(validate_token("").is_err());
        assert!(validate_token(&"x".repeat(MAX_TOKEN_LEN + 1)).is_err());
        assert!(validate_token("../escape").is_err());
        assert!(validate_token("has space").is_err());
        assert!(validate_token("há").is_err());
    }

    #[test]
    fn new_session_resolves_mime_from_name() {
        let session = UploadSession::new(&chunk("t1"));
        assert_eq!(session.mime_type, "application/pdf");
        assert_eq!(session.status, SessionStatus::Receiving);
        assert_eq!(session.received.len(), 3);
        assert!(session.received.is_empty());
    }

    #[test]
    fn progress_reports_missing_indices() {
        let mut session = UploadSession::new(&chunk("t2"));
        session.received.set(2);

        let progress = session.progress();
        assert_eq!(progress.received, 1);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.missing, vec![0, 1]);
        assert!(progress.stored_path.is_none());
    }
}
