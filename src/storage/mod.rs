//! Storage layer: validated storage paths, MIME policy, and blob backends.

mod disk;
pub(crate) mod layout;
pub mod mime;
pub mod path;

pub use disk::{BlobStore, DiskStore};
pub use path::{Area, StoragePath};
