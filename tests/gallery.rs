//! Gallery behavior against in-memory collaborators.

mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use common::{native_photo, web_photo, FakeCapture, FakeFetcher, MemoryFiles};
use photoscan::error::{CaptureError, Error, StorageError};
use photoscan::platform::{NativePlatform, Platform, WebPlatform};
use photoscan::storage::{Directory, KeyValueStore, MemoryPreferences};
use photoscan::{PhotoEvent, PhotoEvents, PhotoRecord, PhotoStore, PHOTO_STORAGE};

struct Harness {
    store: PhotoStore,
    capture: Arc<FakeCapture>,
    files: Arc<MemoryFiles>,
    preferences: Arc<MemoryPreferences>,
}

async fn harness(platform: Arc<dyn Platform>, preferences: MemoryPreferences) -> Harness {
    let capture = Arc::new(FakeCapture::new());
    let files = Arc::new(MemoryFiles::new());
    let preferences = Arc::new(preferences);
    let store = PhotoStore::open(
        platform,
        capture.clone(),
        files.clone(),
        preferences.clone(),
        PhotoEvents::default(),
    )
    .await
    .unwrap();

    Harness {
        store,
        capture,
        files,
        preferences,
    }
}

async fn native() -> Harness {
    harness(Arc::new(NativePlatform::default()), MemoryPreferences::new()).await
}

async fn web() -> Harness {
    harness(
        Arc::new(WebPlatform::new(Arc::new(FakeFetcher::new()))),
        MemoryPreferences::new(),
    )
    .await
}

fn is_generated_file_name(name: &str) -> bool {
    name.strip_suffix(".jpeg")
        .map(|ms| !ms.is_empty() && ms.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[tokio::test]
async fn test_native_capture_uses_written_uri() {
    let h = native().await;
    h.files.insert("/DCIM/IMG_0001.jpg", None, "QUJD");
    h.capture.push(native_photo("/DCIM/IMG_0001.jpg"));

    let record = h.store.capture_photo().await.unwrap();

    assert!(record.file_path.starts_with("file:///app/data/"));
    assert!(is_generated_file_name(
        record.file_path.rsplit('/').next().unwrap()
    ));
    let served = record.file_path.strip_prefix("file://").unwrap();
    assert_eq!(
        record.display_path,
        format!("http://localhost/_capacitor_file_{}", served)
    );

    // Bytes were copied from the native path into the data area.
    let name = record.file_path.rsplit('/').next().unwrap();
    assert_eq!(h.files.get(name, Some(Directory::Data)).unwrap(), "QUJD");
}

#[tokio::test]
async fn test_web_capture_stores_data_url_and_web_path() {
    let h = web().await;
    h.capture.push(web_photo("blob://x"));

    let record = h.store.capture_photo().await.unwrap();

    assert!(is_generated_file_name(&record.file_path));
    assert_eq!(record.display_path, "blob://x");

    let stored = h
        .files
        .get(&record.file_path, Some(Directory::Data))
        .unwrap();
    assert!(stored.starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_capture_persists_list() {
    let h = web().await;
    h.capture.push(web_photo("blob://x"));

    let record = h.store.capture_photo().await.unwrap();

    let raw = h.preferences.get(PHOTO_STORAGE).await.unwrap().unwrap();
    let stored: Vec<PhotoRecord> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored, vec![record]);
}

#[tokio::test]
async fn test_load_after_capture_returns_one_hydrated_record() {
    let h = web().await;
    h.capture.push(web_photo("blob://x"));
    let record = h.store.capture_photo().await.unwrap();

    let photos = h.store.load_photos().await.unwrap();

    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].file_path, record.file_path);
    assert!(photos[0]
        .display_path
        .starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_newest_capture_first() {
    let h = web().await;
    h.capture.push(web_photo("blob://a")).push(web_photo("blob://b"));

    let a = h.store.capture_photo().await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let b = h.store.capture_photo().await.unwrap();

    assert_eq!(h.store.photos().await, vec![b.clone(), a.clone()]);

    let loaded = h.store.load_photos().await.unwrap();
    let order: Vec<_> = loaded.iter().map(|r| r.file_path.clone()).collect();
    assert_eq!(order, vec![b.file_path, a.file_path]);
}

#[tokio::test]
async fn test_empty_stored_list_loads_without_file_io() {
    let preferences = MemoryPreferences::new();
    preferences.set(PHOTO_STORAGE, "[]").await.unwrap();
    let h = harness(
        Arc::new(WebPlatform::new(Arc::new(FakeFetcher::new()))),
        preferences,
    )
    .await;

    let photos = h.store.load_photos().await.unwrap();

    assert!(photos.is_empty());
    assert_eq!(h.files.total_calls(), 0);
}

#[tokio::test]
async fn test_malformed_stored_list_loads_empty() {
    let preferences = MemoryPreferences::new();
    preferences
        .set(PHOTO_STORAGE, "not json at all")
        .await
        .unwrap();
    let h = harness(Arc::new(NativePlatform::default()), preferences).await;

    assert!(h.store.load_photos().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_native_load_keeps_stored_display_path() {
    let preferences = MemoryPreferences::new();
    preferences
        .set(
            PHOTO_STORAGE,
            r#"[{"filepath":"file:///app/data/1.jpeg","webviewPath":"http://localhost/_capacitor_file_/app/data/1.jpeg"}]"#,
        )
        .await
        .unwrap();
    let h = harness(Arc::new(NativePlatform::default()), preferences).await;

    let photos = h.store.load_photos().await.unwrap();

    assert_eq!(
        photos,
        vec![PhotoRecord::new(
            "file:///app/data/1.jpeg",
            "http://localhost/_capacitor_file_/app/data/1.jpeg"
        )]
    );
    assert_eq!(h.files.total_calls(), 0);
}

#[tokio::test]
async fn test_subscriber_receives_added_record() {
    let h = web().await;
    let mut events = h.store.subscribe();
    h.capture.push(web_photo("blob://x"));

    let record = h.store.capture_photo().await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.name(), "photo-added");
    assert_eq!(event, PhotoEvent::Added(record));
}

#[tokio::test]
async fn test_capture_failure_changes_nothing() {
    let h = web().await;
    let mut events = h.store.subscribe();
    h.capture.push_error(CaptureError::PermissionDenied);

    let err = h.store.capture_photo().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Capture(CaptureError::PermissionDenied)
    ));
    assert_eq!(h.capture.calls.load(Ordering::SeqCst), 1);
    assert!(h.store.photos().await.is_empty());
    assert!(h.preferences.get(PHOTO_STORAGE).await.unwrap().is_none());
    assert_eq!(h.files.total_calls(), 0);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_concurrent_captures_are_all_recorded() {
    let h = Arc::new(web().await);
    for i in 0..4 {
        h.capture.push(web_photo(&format!("blob://{}", i)));
    }

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let h = h.clone();
            tokio::spawn(async move { h.store.capture_photo().await.unwrap() })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let raw = h.preferences.get(PHOTO_STORAGE).await.unwrap().unwrap();
    let stored: Vec<PhotoRecord> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored, h.store.photos().await);
    let names: HashSet<_> = stored.iter().map(|r| r.file_path.as_str()).collect();
    assert_eq!(names.len(), 4);
}

#[tokio::test]
async fn test_back_to_back_captures_get_distinct_files() {
    let h = native().await;
    let sources = ["/DCIM/a.jpg", "/DCIM/b.jpg", "/DCIM/c.jpg", "/DCIM/d.jpg"];
    let contents = ["QQ==", "Qg==", "Qw==", "RA=="];
    for (path, data) in sources.iter().zip(contents) {
        h.files.insert(path, None, data);
        h.capture.push(native_photo(path));
    }

    let mut records = Vec::new();
    for _ in 0..sources.len() {
        records.push(h.store.capture_photo().await.unwrap());
    }

    let paths: HashSet<_> = records.iter().map(|r| r.file_path.clone()).collect();
    assert_eq!(paths.len(), records.len());

    // Oldest capture first, so each record maps back to its source bytes.
    for (record, expected) in records.iter().zip(contents) {
        let name = record.file_path.rsplit('/').next().unwrap();
        assert!(is_generated_file_name(name));
        assert_eq!(h.files.get(name, Some(Directory::Data)).unwrap(), expected);
    }
}

#[tokio::test]
async fn test_native_load_derives_missing_display_path() {
    let preferences = MemoryPreferences::new();
    preferences
        .set(PHOTO_STORAGE, r#"[{"filepath":"file:///app/data/1.jpeg"}]"#)
        .await
        .unwrap();
    let h = harness(Arc::new(NativePlatform::default()), preferences).await;

    let photos = h.store.load_photos().await.unwrap();

    assert_eq!(
        photos,
        vec![PhotoRecord::new(
            "file:///app/data/1.jpeg",
            "http://localhost/_capacitor_file_/app/data/1.jpeg"
        )]
    );
    assert_eq!(h.files.total_calls(), 0);
}

#[tokio::test]
async fn test_web_load_missing_file_is_storage_error() {
    let preferences = MemoryPreferences::new();
    preferences
        .set(
            PHOTO_STORAGE,
            r#"[{"filepath":"1700000000000.jpeg","webviewPath":"blob://gone"}]"#,
        )
        .await
        .unwrap();
    let h = harness(
        Arc::new(WebPlatform::new(Arc::new(FakeFetcher::new()))),
        preferences,
    )
    .await;

    let err = h.store.load_photos().await.unwrap_err();

    match err {
        Error::Storage(StorageError::NotFound(path)) => assert_eq!(path, "1700000000000.jpeg"),
        other => panic!("unexpected error: {}", other),
    }
}

/// Preferences whose writes can be switched off.
#[derive(Default)]
struct FlakyPreferences {
    inner: MemoryPreferences,
    fail_writes: AtomicBool,
}

#[async_trait]
impl KeyValueStore for FlakyPreferences {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::InvalidData("preferences are read-only".into()));
        }
        self.inner.set(key, value).await
    }
}

#[tokio::test]
async fn test_failed_persist_leaves_list_unchanged() {
    let capture = Arc::new(FakeCapture::new());
    let preferences = Arc::new(FlakyPreferences::default());
    let store = PhotoStore::open(
        Arc::new(WebPlatform::new(Arc::new(FakeFetcher::new()))),
        capture.clone(),
        Arc::new(MemoryFiles::new()),
        preferences.clone(),
        PhotoEvents::default(),
    )
    .await
    .unwrap();
    capture
        .push(web_photo("blob://lost"))
        .push(web_photo("blob://kept"));

    preferences.fail_writes.store(true, Ordering::SeqCst);
    let err = store.capture_photo().await.unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::InvalidData(_))));
    assert!(store.photos().await.is_empty());

    preferences.fail_writes.store(false, Ordering::SeqCst);
    let kept = store.capture_photo().await.unwrap();

    let raw = preferences.get(PHOTO_STORAGE).await.unwrap().unwrap();
    let stored: Vec<PhotoRecord> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored, vec![kept.clone()]);
    assert_eq!(store.photos().await, vec![kept]);
}
