//! photoscan - photo capture, gallery storage and OCR orchestration.
//!
//! Captured photos are written to file storage and tracked in a persisted,
//! newest-first gallery list; text recognition runs on a fixed pool of
//! prepared workers fed from a shared job queue.

pub mod capture;
pub mod config;
pub mod error;
pub mod events;
pub mod gallery;
pub mod models;
pub mod ocr;
pub mod platform;
pub mod scanner;
pub mod services;
pub mod storage;

pub use error::{Error, Result};
pub use events::{PhotoEvent, PhotoEvents};
pub use gallery::{PhotoStore, PHOTO_STORAGE};
pub use models::{CapturedPhoto, PhotoRecord};
pub use services::PhotoService;
