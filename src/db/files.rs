//! File record database operations

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;

/// Stored file record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileRecord {
    pub id: String,
    pub user_id: i64,
    pub file_name: String,
    pub stored_path: String,
    pub mime_type: String,
    pub size: i64,
    pub content_hash: String,
    pub category: String,
    pub related_id: Option<i64>,
    pub status: String,
    pub created_at: String,
}

/// New file record to insert
#[derive(Debug, Clone)]
pub struct NewFile {
    pub user_id: i64,
    pub file_name: String,
    pub stored_path: String,
    pub mime_type: String,
    pub size: i64,
    pub content_hash: String,
    pub category: String,
    pub related_id: Option<i64>,
}

/// File record repository
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new completed file record
    pub async fn create(&self, data: NewFile) -> Result<FileRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO files (id, user_id, file_name, stored_path, mime_type, size, content_hash, category, related_id, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'completed', ?)
            "#,
        )
        .bind(&id)
        .bind(data.user_id)
        .bind(&data.file_name)
        .bind(&data.stored_path)
        .bind(&data.mime_type)
        .bind(data.size)
        .bind(&data.content_hash)
        .bind(&data.category)
        .bind(data.related_id)
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(FileRecord {
            id,
            user_id: data.user_id,
            file_name: data.file_name,
            stored_path: data.stored_path,
            mime_type: data.mime_type,
            size: data.size,
            content_hash: data.content_hash,
            category: data.category,
            related_id: data.related_id,
            status: "completed".to_string(),
            created_at: now,
        })
    }

    /// Get a file record by ID
    pub async fn get(&self, id: &str) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, user_id, file_name, stored_path, mime_type, size,
                   content_hash, category, related_id, status, created_at
            FROM files
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Find the earliest completed record with the given content hash.
    ///
    /// Returns the oldest match so repeated uploads of the same bytes always
    /// resolve to a single canonical record.
    pub async fn find_by_hash(&self, content_hash: &str) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, user_id, file_name, stored_path, mime_type, size,
                   content_hash, category, related_id, status, created_at
            FROM files
            WHERE content_hash = ? AND status = 'completed'
            ORDER BY created_at ASC, rowid ASC
            LIMIT 1
            "#,
        )
        .bind(content_hash)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use tempfile::TempDir;

    async fn test_pool(dir: &TempDir) -> SqlitePool {
        let url = format!("sqlite://{}/test.db", dir.path().display());
        create_pool(&url).await.unwrap()
    }

    fn new_file(user_id: i64, hash: &str) -> NewFile {
        NewFile {
            user_id,
            file_name: "lecture.pdf".to_string(),
            stored_path: format!("private/uploads/{user_id}/notes/lecture.pdf"),
            mime_type: "application/pdf".to_string(),
            size: 1024,
            content_hash: hash.to_string(),
            category: "notes".to_string(),
            related_id: None,
        }
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;
        let repo = FileRepository::new(&pool);

        let created = repo.create(new_file(7, "abc123")).await.unwrap();
        let fetched = repo.get(&created.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.user_id, 7);
        assert_eq!(fetched.content_hash, "abc123");
        assert_eq!(fetched.status, "completed");
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;
        let repo = FileRepository::new(&pool);

        assert!(repo.get("no-such-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_hash_returns_earliest_match() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;
        let repo = FileRepository::new(&pool);

        let first = repo.create(new_file(1, "samehash")).await.unwrap();
        let _second = repo.create(new_file(2, "samehash")).await.unwrap();

        let found = repo.find_by_hash("samehash").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);

        assert!(repo.find_by_hash("otherhash").await.unwrap().is_none());
    }
}
