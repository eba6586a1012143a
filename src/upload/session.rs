//! Upload Session Registry
//!
//! Tracks in-flight chunked uploads keyed by caller-supplied token:
//! - In-memory session storage behind an async RwLock
//! - Two-phase chunk intake: admit before the byte write, commit after
//! - Single-winner transition into assembly when the last chunk lands
//!
//! Sessions do not survive a restart; durable state lives in the file
//! records written after assembly.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{Result, UploadError};
use super::types::{
    ChunkUpload, MAX_CHUNK_COUNT, SessionStatus, UploadProgress, UploadSession, validate_token,
};

// ============================================================================
// Intake Outcomes
// ============================================================================

/// Outcome of admitting a chunk, decided before its bytes are written.
#[derive(Debug)]
pub(crate) enum Admission {
    /// New index for a live session; write the bytes, then commit.
    Accept,
    /// Index already received; there is nothing to write.
    Duplicate { received: u32, total: u32 },
}

/// Outcome of committing a chunk after its bytes are on disk.
#[derive(Debug)]
pub(crate) enum Commit {
    /// Chunk recorded; more indices are still missing.
    Progress { received: u32, total: u32 },
    /// Another call recorded this index first.
    Duplicate { received: u32, total: u32 },
    /// This chunk completed the set; the caller must run assembly.
    Assemble(AssemblyJob),
}

/// Everything assembly needs, detached from the registry lock.
#[derive(Debug, Clone)]
pub(crate) struct AssemblyJob {
    pub token: String,
    pub user_id: i64,
    pub file_name: String,
    pub mime_type: String,
    pub total_chunks: u32,
}

// ============================================================================
// Session Registry
// ============================================================================

/// Registry of in-flight upload sessions
#[derive(Clone)]
pub(crate) struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    /// Active sessions indexed by token
    sessions: RwLock<HashMap<String, UploadSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    // ========================================================================
    // Chunk Intake
    // ========================================================================

    /// Admit a chunk before its bytes are written.
    ///
    /// Creates the session on first contact with a token and re-creates it
    /// when the previous attempt under that token failed. Duplicate indices
    /// are reported without error so retried chunks stay harmless.
    pub async fn admit(&self, chunk: &ChunkUpload) -> Result<Admission> {
        validate_token(&chunk.token)?;

        if chunk.total_chunks == 0 || chunk.total_chunks > MAX_CHUNK_COUNT {
            return Err(UploadError::InvalidChunkCount(chunk.total_chunks));
        }
        if chunk.index >= chunk.total_chunks {
            return Err(UploadError::ChunkIndexOutOfBounds {
                index: chunk.index,
                total: chunk.total_chunks,
            });
        }

        let mut sessions = self.inner.sessions.write().await;

        let session = match sessions.entry(chunk.token.clone()) {
            Entry::Vacant(entry) => {
                tracing::info!(
                    token = %chunk.token,
                    file_name = %chunk.file_name,
                    total_chunks = chunk.total_chunks,
                    "Created upload session"
                );
                entry.insert(UploadSession::new(chunk));
                return Ok(Admission::Accept);
            }
            Entry::Occupied(entry) => entry.into_mut(),
        };

        match session.status {
            SessionStatus::Completed => {
                return Err(UploadError::SessionCompleted(chunk.token.clone()));
            }
            SessionStatus::Failed => {
                // A failed attempt releases its token for a fresh try.
                tracing::info!(
                    token = %chunk.token,
                    file_name = %chunk.file_name,
                    "Restarting failed upload session"
                );
                *session = UploadSession::new(chunk);
                return Ok(Admission::Accept);
            }
            SessionStatus::Assembling => {
                // Assembly only starts once every index is present, so any
                // late chunk is by definition a duplicate.
                return Ok(Admission::Duplicate {
                    received: session.received.count(),
                    total: session.received.len(),
                });
            }
            SessionStatus::Receiving => {}
        }

        if chunk.total_chunks != session.received.len() {
            return Err(UploadError::InvalidChunkCount(chunk.total_chunks));
        }

        if session.received.contains(chunk.index) {
            return Ok(Admission::Duplicate {
                received: session.received.count(),
                total: session.received.len(),
            });
        }

        Ok(Admission::Accept)
    }

    /// Commit a chunk whose bytes are on disk.
    ///
    /// Exactly one committer observes the bitmap become full and receives
    /// [`Commit::Assemble`]; the session is moved to `Assembling` in the
    /// same critical section, so concurrent finishers see a duplicate.
    pub async fn commit(&self, token: &str, index: u32) -> Result<Commit> {
        let mut sessions = self.inner.sessions.write().await;

        let session = sessions
            .get_mut(token)
            .ok_or_else(|| UploadError::SessionNotFound(token.to_string()))?;

        if session.status != SessionStatus::Receiving {
            // The session finished or failed while our bytes were in flight;
            // every index was already accounted for.
            return Ok(Commit::Duplicate {
                received: session.received.count(),
                total: session.received.len(),
            });
        }

        session.touch();

        if !session.received.set(index) {
            return Ok(Commit::Duplicate {
                received: session.received.count(),
                total: session.received.len(),
            });
        }

        tracing::debug!(
            token = %token,
            index = index,
            received = session.received.count(),
            total = session.received.len(),
            "Chunk received"
        );

        if session.received.is_full() {
            session.status = SessionStatus::Assembling;
            return Ok(Commit::Assemble(AssemblyJob {
                token: session.token.clone(),
                user_id: session.user_id,
                file_name: session.file_name.clone(),
                mime_type: session.mime_type.clone(),
                total_chunks: session.received.len(),
            }));
        }

        Ok(Commit::Progress {
            received: session.received.count(),
            total: session.received.len(),
        })
    }

    // ========================================================================
    // Session Lifecycle
    // ========================================================================

    /// Mark a session completed after assembly stored and recorded the file
    pub async fn finalize(&self, token: &str, stored_path: String, content_hash: String) {
        let mut sessions = self.inner.sessions.write().await;

        match sessions.get_mut(token) {
            Some(session) => {
                session.status = SessionStatus::Completed;
                session.stored_path = Some(stored_path);
                session.content_hash = Some(content_hash);
                session.touch();

                tracing::info!(
                    token = %token,
                    file_name = %session.file_name,
                    "Upload session completed"
                );
            }
            // Cancelled while assembling; the file record still exists.
            None => tracing::debug!(token = %token, "Finalized session no longer tracked"),
        }
    }

    /// Mark a session failed so the token can be reused
    pub async fn fail(&self, token: &str) {
        let mut sessions = self.inner.sessions.write().await;

        match sessions.get_mut(token) {
            Some(session) => {
                session.status = SessionStatus::Failed;
                session.touch();
                tracing::warn!(
                    token = %token,
                    file_name = %session.file_name,
                    "Upload session failed"
                );
            }
            None => tracing::debug!(token = %token, "Failed session no longer tracked"),
        }
    }

    /// Remove a session
    pub async fn cancel(&self, token: &str) -> Result<UploadSession> {
        let mut sessions = self.inner.sessions.write().await;

        let session = sessions
            .remove(token)
            .ok_or_else(|| UploadError::SessionNotFound(token.to_string()))?;

        tracing::info!(
            token = %token,
            file_name = %session.file_name,
            "Upload session cancelled"
        );

        Ok(session)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Progress snapshot for a token, if it names a live session
    pub async fn progress(&self, token: &str) -> Option<UploadProgress> {
        let sessions = self.inner.sessions.read().await;
        sessions.get(token).map(UploadSession::progress)
    }

    /// Number of tracked sessions
    pub async fn session_count(&self) -> usize {
        let sessions = self.inner.sessions.read().await;
        sessions.len()
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    /// Remove sessions with no activity since `idle_timeout` ago.
    ///
    /// Sessions mid-assembly are skipped. Returns the removed tokens so the
    /// caller can delete their chunk directories.
    pub async fn sweep_idle(&self, idle_timeout: Duration) -> Vec<String> {
        // A timeout too large to represent puts the cutoff before the
        // beginning of time; no session can be idle that long.
        let cutoff = chrono::Duration::from_std(idle_timeout)
            .ok()
            .and_then(|idle| Utc::now().checked_sub_signed(idle));
        let Some(cutoff) = cutoff else {
            return Vec::new();
        };

        let mut sessions = self.inner.sessions.write().await;

        let stale: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.status != SessionStatus::Assembling && s.idle_since(cutoff))
            .map(|(token, _)| token.clone())
            .collect();

        for token in &stale {
            sessions.remove(token);
            tracing::debug!(token = %token, "Swept idle upload session");
        }

        if !stale.is_empty() {
            tracing::info!(count = stale.len(), "Swept idle upload sessions");
        }

        stale
    }

    /// Rewind a session's activity clock (test support)
    #[cfg(test)]
    pub async fn backdate(&self, token: &str, secs: i64) {
        let mut sessions = self.inner.sessions.write().await;
        if let Some(session) = sessions.get_mut(token) {
            session.last_activity = session.last_activity - chrono::Duration::seconds(secs);
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
