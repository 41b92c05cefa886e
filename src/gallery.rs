//! Photo record store: turns captures into persisted gallery records.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::capture::{CaptureOptions, ImageCapture};
use crate::error::{Result, StorageError};
use crate::events::{PhotoEvent, PhotoEvents};
use crate::models::{CapturedPhoto, PhotoRecord};
use crate::platform::Platform;
use crate::storage::{Directory, FileStorage, KeyValueStore};

/// Preference key the gallery list is stored under.
pub const PHOTO_STORAGE: &str = "photos";

/// Ordered gallery of captured photos, newest first.
///
/// The in-memory list is held in stored form (display paths as written at
/// capture time); re-hydration only affects what [`PhotoStore::load_photos`]
/// returns. The list lock is held across the whole capture flow, so
/// concurrent captures are applied one at a time.
pub struct PhotoStore {
    platform: Arc<dyn Platform>,
    capture: Arc<dyn ImageCapture>,
    files: Arc<dyn FileStorage>,
    preferences: Arc<dyn KeyValueStore>,
    events: PhotoEvents,
    capture_options: CaptureOptions,
    state: Mutex<GalleryState>,
}

#[derive(Default)]
struct GalleryState {
    photos: Vec<PhotoRecord>,
    /// Timestamp behind the most recent generated file name.
    last_issued_ms: i64,
}

impl GalleryState {
    /// Next file-name timestamp; strictly increasing so names never repeat.
    fn issue_timestamp(&mut self, now_ms: i64) -> i64 {
        let issued = now_ms.max(self.last_issued_ms + 1);
        self.last_issued_ms = issued;
        issued
    }
}

impl PhotoStore {
    /// Open the gallery, seeding the in-memory list from preferences.
    pub async fn open(
        platform: Arc<dyn Platform>,
        capture: Arc<dyn ImageCapture>,
        files: Arc<dyn FileStorage>,
        preferences: Arc<dyn KeyValueStore>,
        events: PhotoEvents,
    ) -> Result<Self> {
        let stored = read_stored(preferences.as_ref()).await?;
        info!(
            "Opened gallery with {} photo(s) ({} runtime)",
            stored.len(),
            platform.kind()
        );

        Ok(Self {
            platform,
            capture,
            files,
            preferences,
            events,
            capture_options: CaptureOptions::default(),
            state: Mutex::new(GalleryState {
                photos: stored,
                last_issued_ms: 0,
            }),
        })
    }

    /// Override the options passed to the capture provider.
    pub fn with_capture_options(mut self, options: CaptureOptions) -> Self {
        self.capture_options = options;
        self
    }

    pub fn events(&self) -> &PhotoEvents {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PhotoEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the in-memory list, in stored form.
    pub async fn photos(&self) -> Vec<PhotoRecord> {
        self.state.lock().await.photos.clone()
    }

    /// Capture a photo, store it, and prepend its record to the gallery.
    pub async fn capture_photo(&self) -> Result<PhotoRecord> {
        let mut state = self.state.lock().await;

        let captured = self.capture.get_photo(&self.capture_options).await?;
        let issued_ms = state.issue_timestamp(Utc::now().timestamp_millis());
        let record = self.save_photo(&captured, issued_ms).await?;

        self.events.dispatch(PhotoEvent::Added(record.clone()));

        // The in-memory list only changes once the new list is persisted.
        let mut photos = Vec::with_capacity(state.photos.len() + 1);
        photos.push(record.clone());
        photos.extend(state.photos.iter().cloned());
        let serialized = serde_json::to_string(&photos).map_err(StorageError::from)?;
        self.preferences.set(PHOTO_STORAGE, &serialized).await?;
        state.photos = photos;

        info!(
            "Added {} to gallery ({} photo(s))",
            record.file_path,
            state.photos.len()
        );
        Ok(record)
    }

    /// Load the persisted gallery.
    ///
    /// Replaces the in-memory list with what is stored, then lets the platform
    /// materialize display paths: browser runtimes re-read every file, native
    /// runtimes only fill in display paths that were never stored.
    pub async fn load_photos(&self) -> Result<Vec<PhotoRecord>> {
        let stored = read_stored(self.preferences.as_ref()).await?;
        self.state.lock().await.photos = stored.clone();

        let mut hydrated = Vec::with_capacity(stored.len());
        for record in stored {
            hydrated.push(self.platform.hydrate(record, self.files.as_ref()).await?);
        }
        Ok(hydrated)
    }

    async fn save_photo(&self, captured: &CapturedPhoto, issued_ms: i64) -> Result<PhotoRecord> {
        let data = self
            .platform
            .encode_capture(captured, self.files.as_ref())
            .await?;
        let file_name = PhotoRecord::file_name_for(issued_ms);

        let written = self
            .files
            .write_file(&file_name, &data, Directory::Data)
            .await?;
        debug!("Stored capture as {} ({})", file_name, written.uri);

        Ok(self.platform.build_record(&file_name, &written, captured)?)
    }
}

async fn read_stored(preferences: &dyn KeyValueStore) -> Result<Vec<PhotoRecord>> {
    let Some(raw) = preferences.get(PHOTO_STORAGE).await? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Option<Vec<PhotoRecord>>>(&raw) {
        Ok(records) => Ok(records
            .unwrap_or_default()
            .into_iter()
            .filter(|r| !r.file_path.is_empty())
            .collect()),
        Err(e) => {
            warn!("Stored photo list is unreadable ({}), using empty list", e);
            Ok(Vec::new())
        }
    }
}
