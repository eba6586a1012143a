//! Satchel
//!
//! File upload pipeline for content-sharing services: resumable chunked
//! uploads reassembled on the server, single-call whole-file stores, and
//! content-hash duplicate lookup over a private/public storage split.
//!
//! # Modules
//!
//! - `upload`: chunked sessions, assembly, and the [`UploadService`] facade
//! - `storage`: validated storage paths, MIME policy, and blob backends
//! - `db`: SQLite persistence for stored file records
//!
//! # Example
//!
//! ```no_run
//! use satchel::{Config, UploadService};
//! use satchel::upload::ChunkUpload;
//!
//! # async fn run() -> satchel::Result<()> {
//! let config = Config::from_env();
//! let service = UploadService::new(&config).await?;
//!
//! let receipt = service
//!     .receive_chunk(ChunkUpload {
//!         token: "client-chosen-token".to_string(),
//!         user_id: 7,
//!         index: 0,
//!         total_chunks: 3,
//!         file_name: "lecture.mp4".to_string(),
//!         mime_type: None,
//!         declared_size: 6_291_456,
//!         data: vec![0u8; 2_097_152],
//!     })
//!     .await?;
//! assert_eq!(receipt.received, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod hash;
pub mod storage;
pub mod upload;

pub use config::Config;
pub use error::{Result, UploadError};
pub use upload::UploadService;
