//! Photo service facade.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::error;

use crate::capture::{HttpImageFetcher, ImageCapture, ImageFetcher};
use crate::config::Settings;
use crate::error::{Error, Result, StorageError};
use crate::events::{PhotoEvent, PhotoEvents};
use crate::gallery::PhotoStore;
use crate::models::PhotoRecord;
use crate::ocr::{
    ImageLike, JobKind, JobOutput, JobPayload, OcrSourceType, OcrTextResult, RecognitionPool,
    TesseractTextRecognizer, TesseractWorkerFactory, TextRecognizer,
};
use crate::platform::{NativePlatform, Platform, RuntimeKind, WebPlatform};
use crate::scanner::{scan_documents, CommandDocumentScanner, DocumentScanner, ScanOutcome};
use crate::storage::{JsonFilePreferences, LocalFileStorage};

/// Photo capture, gallery storage and text recognition.
pub struct PhotoService {
    store: PhotoStore,
    pool: RecognitionPool,
    scanner: Arc<dyn DocumentScanner>,
    recognizer: Arc<dyn TextRecognizer>,
    platform: Arc<dyn Platform>,
}

impl PhotoService {
    pub fn new(
        store: PhotoStore,
        pool: RecognitionPool,
        scanner: Arc<dyn DocumentScanner>,
        recognizer: Arc<dyn TextRecognizer>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            store,
            pool,
            scanner,
            recognizer,
            platform,
        }
    }

    /// Wire the local collaborators described by `settings`.
    ///
    /// Starts the recognition pool, so this fails if too few workers can be
    /// prepared.
    pub async fn from_settings(settings: &Settings, capture: Arc<dyn ImageCapture>) -> Result<Self> {
        let fetcher: Arc<dyn ImageFetcher> =
            Arc::new(HttpImageFetcher::new(settings.fetch_timeout)?);
        let platform = platform_for(settings, fetcher.clone());
        let store = open_gallery(settings, platform.clone(), capture).await?;

        let factory = TesseractWorkerFactory::new(settings.tesseract.clone(), fetcher);
        let pool = RecognitionPool::start(&factory, settings.pool.clone()).await?;

        let scanner = Arc::new(CommandDocumentScanner::new(
            settings.scanner_program.clone(),
            settings.scanner_args.clone(),
            settings.scans_dir(),
        ));
        let recognizer = Arc::new(TesseractTextRecognizer::new(
            settings.tesseract.binary.clone(),
            settings.pool.language.clone(),
        ));

        Ok(Self::new(store, pool, scanner, recognizer, platform))
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    pub fn pool(&self) -> &RecognitionPool {
        &self.pool
    }

    /// Capture a photo and add it to the front of the gallery.
    pub async fn add_new_photo_to_gallery(&self) -> Result<PhotoRecord> {
        self.store.capture_photo().await
    }

    /// Load the persisted gallery, ready for display.
    pub async fn load_saved_photos(&self) -> Result<Vec<PhotoRecord>> {
        self.store.load_photos().await
    }

    /// Recognize text in an image on the worker pool.
    pub async fn recognize_image(&self, image: ImageLike) -> Result<JobOutput> {
        Ok(self.pool.recognize(image).await?)
    }

    /// Submit any job kind to the worker pool.
    pub async fn submit_job(&self, kind: JobKind, payload: JobPayload) -> Result<JobOutput> {
        Ok(self.pool.submit_job(kind, payload).await?)
    }

    /// Scan documents, unless running inside a hybrid native shell.
    pub async fn scan_document(&self) -> Result<ScanOutcome> {
        Ok(scan_documents(self.platform.as_ref(), self.scanner.as_ref()).await?)
    }

    /// Recognize text in a base64 image with the secondary engine.
    pub async fn recognize_text(&self, data: &str) -> Result<OcrTextResult> {
        self.recognizer
            .rec_text(OcrSourceType::Base64, data)
            .await
            .map_err(|e| {
                error!("Secondary OCR failed: {}", e);
                Error::from(e)
            })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PhotoEvent> {
        self.store.subscribe()
    }

    /// Stop the recognition pool.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

/// Platform matching the configured runtime.
pub fn platform_for(settings: &Settings, fetcher: Arc<dyn ImageFetcher>) -> Arc<dyn Platform> {
    match settings.runtime {
        RuntimeKind::Native => Arc::new(NativePlatform::new(settings.servable_host.clone())),
        RuntimeKind::Web => Arc::new(WebPlatform::new(fetcher)),
    }
}

/// Open the gallery stored under the configured data directory.
pub async fn open_gallery(
    settings: &Settings,
    platform: Arc<dyn Platform>,
    capture: Arc<dyn ImageCapture>,
) -> Result<PhotoStore> {
    settings
        .ensure_directories()
        .map_err(|e| StorageError::io(settings.data_dir.display().to_string(), e))?;

    PhotoStore::open(
        platform,
        capture,
        Arc::new(LocalFileStorage::new(&settings.data_dir)),
        Arc::new(JsonFilePreferences::new(settings.preferences_path())),
        PhotoEvents::default(),
    )
    .await
}
