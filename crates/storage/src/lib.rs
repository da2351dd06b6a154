#![forbid(unsafe_code)]

pub mod file;
pub mod repository;

pub use file::FileStore;
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
