//! Chunked Upload Module
//!
//! Client-driven chunked uploads with:
//! - Caller-supplied session tokens and out-of-order chunk arrival
//! - Idempotent per-index receipt tracking in a bitmap
//! - Single-winner file assembly when the last chunk lands
//!
//! Flow:
//! 1. Client picks a token and sends each chunk with its index and count
//! 2. Chunks land in a per-session temp directory, in any order
//! 3. The call that lands the final missing chunk assembles the file
//! 4. The artifact is checksummed and recorded for duplicate lookup

mod assembler;
mod bitmap;
mod service;
mod session;
mod types;

pub use bitmap::ChunkBitmap;
pub use service::UploadService;
pub use types::*;
