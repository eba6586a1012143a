//! Blob storage backends.
//!
//! The upload pipeline talks to storage through [`BlobStore`]; the provided
//! implementation is a local filesystem tree with one subtree per [`Area`].

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::Result;
use crate::hash;
use super::path::StoragePath;

/// Byte-level operations the upload pipeline needs from storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes a full payload, creating parent directories as needed.
    /// Readers never observe a partially written blob.
    async fn write(&self, path: &StoragePath, data: &[u8]) -> Result<()>;

    /// Reads a full payload.
    async fn read(&self, path: &StoragePath) -> Result<Vec<u8>>;

    async fn exists(&self, path: &StoragePath) -> bool;

    /// Deletes a file. Deleting a missing file is not an error.
    async fn delete(&self, path: &StoragePath) -> Result<()>;

    async fn create_dir(&self, path: &StoragePath) -> Result<()>;

    /// Removes a directory tree. Missing directories are not an error.
    async fn delete_dir(&self, path: &StoragePath) -> Result<()>;

    /// Concatenates `sources` into `dest` in the given order, opening the
    /// destination once and appending sequentially. Returns bytes written.
    async fn concat(&self, sources: &[StoragePath], dest: &StoragePath) -> Result<u64>;

    /// Streamed content checksum of a stored file.
    async fn checksum(&self, path: &StoragePath) -> Result<String>;
}

/// Filesystem-backed store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn abs(&self, path: &StoragePath) -> PathBuf {
        path.on_disk(&self.root)
    }
}

#[async_trait]
impl BlobStore for DiskStore {
    async fn write(&self, path: &StoragePath, data: &[u8]) -> Result<()> {
        let abs = self.abs(path);
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Stage to a sibling temp file and promote with a rename, so a
        // concurrent reader sees either the old blob or the new one whole.
        let tmp = abs.with_file_name(format!("upload-{}.part", Uuid::new_v4()));
        fs::write(&tmp, data).await?;
        if let Err(e) = fs::rename(&tmp, &abs).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn read(&self, path: &StoragePath) -> Result<Vec<u8>> {
        Ok(fs::read(self.abs(path)).await?)
    }

    async fn exists(&self, path: &StoragePath) -> bool {
        fs::try_exists(self.abs(path)).await.unwrap_or(false)
    }

    async fn delete(&self, path: &StoragePath) -> Result<()> {
        match fs::remove_file(self.abs(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_dir(&self, path: &StoragePath) -> Result<()> {
        fs::create_dir_all(self.abs(path)).await?;
        Ok(())
    }

    async fn delete_dir(&self, path: &StoragePath) -> Result<()> {
        match fs::remove_dir_all(self.abs(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn concat(&self, sources: &[StoragePath], dest: &StoragePath) -> Result<u64> {
        let dest_abs = self.abs(dest);
        if let Some(parent) = dest_abs.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut out = fs::File::create(&dest_abs).await?;
        let mut total = 0u64;
        for source in sources {
            let mut reader = fs::File::open(self.abs(source)).await?;
            total += tokio::io::copy(&mut reader, &mut out).await?;
        }
        out.flush().await?;

        Ok(total)
    }

    async fn checksum(&self, path: &StoragePath) -> Result<String> {
        hash::hash_file(&self.abs(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, DiskStore) {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn write_read_delete_round_trip() {
        let (_dir, store) = store();
        let path = StoragePath::private("uploads/1/notes/a.txt").unwrap();

        store.write(&path, b"hello").await.unwrap();
        assert!(store.exists(&path).await);
        assert_eq!(store.read(&path).await.unwrap(), b"hello");

        store.delete(&path).await.unwrap();
        assert!(!store.exists(&path).await);

        // Deleting again is a no-op.
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn areas_do_not_collide() {
        let (dir, store) = store();
        let private = StoragePath::private("x/same.bin").unwrap();
        let public = StoragePath::public("x/same.bin").unwrap();

        store.write(&private, b"private bytes").await.unwrap();
        store.write(&public, b"public bytes").await.unwrap();

        assert_eq!(store.read(&private).await.unwrap(), b"private bytes");
        assert_eq!(store.read(&public).await.unwrap(), b"public bytes");
        assert!(dir.path().join("private/x/same.bin").exists());
        assert!(dir.path().join("public/x/same.bin").exists());
    }

    #[tokio::test]
    async fn concat_appends_in_order() {
        let (_dir, store) = store();
        let a = StoragePath::private("parts/0").unwrap();
        let b = StoragePath::private("parts/1").unwrap();
        let c = StoragePath::private("parts/2").unwrap();
        store.write(&a, b"one ").await.unwrap();
        store.write(&b, b"two ").await.unwrap();
        store.write(&c, b"three").await.unwrap();

        let dest = StoragePath::private("joined/out.bin").unwrap();
        let written = store
            .concat(&[a, b, c], &dest)
            .await
            .unwrap();

        assert_eq!(written, 13);
        assert_eq!(store.read(&dest).await.unwrap(), b"one two three");
    }

    #[tokio::test]
    async fn checksum_matches_byte_hash() {
        let (_dir, store) = store();
        let path = StoragePath::private("blob.bin").unwrap();
        store.write(&path, b"checksum me").await.unwrap();

        assert_eq!(
            store.checksum(&path).await.unwrap(),
            crate::hash::hash_bytes(b"checksum me")
        );
    }

    #[tokio::test]
    async fn delete_dir_tolerates_missing() {
        let (_dir, store) = store();
        let dir_path = StoragePath::private("tmp/chunks/ghost").unwrap();
        store.delete_dir(&dir_path).await.unwrap();

        store.create_dir(&dir_path).await.unwrap();
        let file = dir_path.join("00000000.chunk").unwrap();
        store.write(&file, b"x").await.unwrap();
        store.delete_dir(&dir_path).await.unwrap();
        assert!(!store.exists(&file).await);
    }
}
