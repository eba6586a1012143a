//! Content hashing helpers.
//!
//! Hashes here are duplicate-detection hints attached to stored files, not
//! integrity proofs.

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::Result;

/// Hex-encoded digest of an in-memory payload.
pub fn hash_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Hex-encoded digest of a file, streamed in fixed-size reads.
pub async fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).await?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_and_stable() {
        let a = hash_bytes(b"lecture notes");
        let b = hash_bytes(b"lecture notes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(hash_bytes(b"a"), hash_bytes(b"b"));
    }

    #[tokio::test]
    async fn file_hash_matches_byte_hash() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        tokio::fs::write(&path, b"same bytes either way").await.unwrap();

        let from_file = hash_file(&path).await.unwrap();
        assert_eq!(from_file, hash_bytes(b"same bytes either way"));
    }
}
