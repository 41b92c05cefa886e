//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use photoscan::capture::{CaptureOptions, FetchedImage, ImageCapture, ImageFetcher};
use photoscan::error::{CaptureError, FetchError, StorageError};
use photoscan::models::CapturedPhoto;
use photoscan::storage::{Directory, FileData, FileStorage, WrittenFile};

/// Minimal JPEG header; enough for MIME sniffing.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

/// Capture provider that hands out queued photos in order.
#[derive(Default)]
pub struct FakeCapture {
    queue: Mutex<VecDeque<Result<CapturedPhoto, CaptureError>>>,
    pub calls: AtomicUsize,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, photo: CapturedPhoto) -> &Self {
        self.queue.lock().unwrap().push_back(Ok(photo));
        self
    }

    pub fn push_error(&self, error: CaptureError) -> &Self {
        self.queue.lock().unwrap().push_back(Err(error));
        self
    }
}

#[async_trait]
impl ImageCapture for FakeCapture {
    async fn get_photo(&self, _options: &CaptureOptions) -> Result<CapturedPhoto, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(CaptureError::Cancelled))
    }
}

/// File storage kept in a map, counting every call.
#[derive(Default)]
pub struct MemoryFiles {
    files: Mutex<HashMap<String, String>>,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(path: &str, directory: Option<Directory>) -> String {
        match directory {
            Some(dir) => format!("{}/{}", dir, path),
            None => path.to_string(),
        }
    }

    /// Seed a file, e.g. the native path a capture points at.
    pub fn insert(&self, path: &str, directory: Option<Directory>, data: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(Self::key(path, directory), data.to_string());
    }

    pub fn get(&self, path: &str, directory: Option<Directory>) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(&Self::key(path, directory))
            .cloned()
    }

    pub fn total_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst) + self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileStorage for MemoryFiles {
    async fn write_file(
        &self,
        path: &str,
        data: &str,
        directory: Directory,
    ) -> Result<WrittenFile, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert(path, Some(directory), data);
        Ok(WrittenFile {
            uri: format!("file:///app/{}/{}", directory, path),
        })
    }

    async fn read_file(
        &self,
        path: &str,
        directory: Option<Directory>,
    ) -> Result<FileData, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let data = self.get(path, directory);
        // Stored data URLs read back as their base64 payload.
        data.map(|d| FileData {
            data: d.rsplit(',').next().unwrap_or_default().to_string(),
        })
        .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

/// Fetcher that returns the same image for every web path.
pub struct FakeFetcher {
    pub fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            fetched: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, web_path: &str) -> Result<FetchedImage, FetchError> {
        self.fetched.lock().unwrap().push(web_path.to_string());
        Ok(FetchedImage {
            bytes: JPEG_BYTES.to_vec(),
            content_type: None,
        })
    }
}

pub fn native_photo(path: &str) -> CapturedPhoto {
    CapturedPhoto {
        web_path: Some(format!("http://localhost/_capacitor_file_{}", path)),
        ..CapturedPhoto::with_path(path)
    }
}

pub fn web_photo(web_path: &str) -> CapturedPhoto {
    CapturedPhoto::with_web_path(web_path)
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
