//! Durable storage collaborators: binary file storage and key-value preferences.
//!
//! Both are traits so the gallery can run against the local filesystem in
//! production and in-memory fakes in tests.

mod data_url;
mod files;
mod preferences;

pub use data_url::{encode_data_url, split_data_url, DEFAULT_IMAGE_MIME};
pub use files::{Directory, FileData, FileStorage, LocalFileStorage, WrittenFile};
pub use preferences::{JsonFilePreferences, KeyValueStore, MemoryPreferences};
