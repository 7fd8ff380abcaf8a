//! ShelfScan Core - client-side logic for shelf-photo book recognition
//!
//! This crate contains the UI-free core of ShelfScan, including:
//! - Image validation and downscaling for upload (`prepare`)
//! - The remote recognition service client (`api`)
//! - The recognition task lifecycle manager (`task`)
//! - Session identity scoping server-side temporary files (`session`)

pub mod api;
pub mod config;
pub mod error;
pub mod prepare;
pub mod session;
pub mod task;

use std::sync::Arc;

use tokio::sync::mpsc;

pub use api::{HttpRecognitionService, RecognitionService, UploadedFile};
pub use config::Config;
pub use error::{ScanError, ScanResult};
pub use prepare::{prepare, prepare_default, PreparedImage};
pub use session::Session;
pub use task::{
    progress_title, Book, OrchestratorSnapshot, Phase, RecognitionResult, ResultSink, TaskEvent,
    TaskOrchestrator, TaskSnapshot, TaskStatus,
};

/// Application state shared with the embedding UI layer.
///
/// Owns the pieces the source of truth for a scan flows through: the
/// session identity, the service client, the task orchestrator and the
/// result sink. Construct once at startup; the returned receiver carries
/// the orchestrator's [`TaskEvent`]s.
pub struct AppState {
    pub config: Config,
    pub session: Session,
    pub service: Arc<dyn RecognitionService>,
    pub orchestrator: TaskOrchestrator,
    pub sink: ResultSink,
}

impl AppState {
    /// Wire up the core against the configured HTTP service.
    pub fn new(config: Config) -> anyhow::Result<(Self, mpsc::Receiver<TaskEvent>)> {
        let session = Session::generate();
        let service: Arc<dyn RecognitionService> =
            Arc::new(HttpRecognitionService::new(&config, session.id())?);
        Ok(Self::with_service(config, session, service))
    }

    /// Wire up the core against an arbitrary service implementation.
    pub fn with_service(
        config: Config,
        session: Session,
        service: Arc<dyn RecognitionService>,
    ) -> (Self, mpsc::Receiver<TaskEvent>) {
        let sink = ResultSink::new();
        let (orchestrator, events) = TaskOrchestrator::new(service.clone(), sink.clone(), &config);
        (
            Self {
                config,
                session,
                service,
                orchestrator,
                sink,
            },
            events,
        )
    }

    /// Validate, downscale and upload a user-selected image.
    ///
    /// The returned handle supersedes any previous upload; pass it to
    /// [`AppState::start_recognition`] when the user confirms.
    pub async fn upload_image(&self, bytes: &[u8], file_name: &str) -> ScanResult<UploadedFile> {
        let prepared = prepare::prepare(bytes, file_name, self.config.upload_quality)?;
        tracing::debug!(
            original = prepared.original_size,
            encoded = prepared.encoded_size,
            width = prepared.width,
            height = prepared.height,
            "image prepared for upload"
        );
        self.service.upload(&prepared, self.session.id()).await
    }

    /// Submit a recognition task for an uploaded file.
    pub async fn start_recognition(&self, file: &UploadedFile) -> ScanResult<String> {
        self.orchestrator
            .start(&file.file_id, &file.session_id)
            .await
    }

    /// Cancel the recognition task currently in flight.
    pub async fn cancel_recognition(&self) -> ScanResult<()> {
        self.orchestrator.cancel().await
    }

    /// Abandon the current task and result, returning the core to idle.
    pub async fn reset(&self) {
        self.orchestrator.reset().await;
    }

    /// Release server-side temporary files for this session.
    pub async fn cleanup(&self) -> ScanResult<usize> {
        self.service.cleanup_session(self.session.id()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    /// Counts upload calls; the orchestrator paths are covered elsewhere.
    #[derive(Default)]
    struct CountingService {
        uploads: AtomicUsize,
    }

    #[async_trait]
    impl RecognitionService for CountingService {
        async fn upload(
            &self,
            image: &PreparedImage,
            session_id: &str,
        ) -> ScanResult<UploadedFile> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(UploadedFile {
                file_id: "f-1".to_string(),
                session_id: session_id.to_string(),
                original_size: image.original_size,
                uploaded_size: image.encoded_size,
                mime: image.mime.to_string(),
            })
        }

        async fn create_task(&self, _file_id: &str, _session_id: &str) -> ScanResult<String> {
            Ok("t-1".to_string())
        }

        async fn fetch_task(&self, _task_id: &str) -> ScanResult<TaskSnapshot> {
            Err(ScanError::service("not scripted"))
        }

        async fn cancel_task(&self, _task_id: &str) -> ScanResult<()> {
            Ok(())
        }

        async fn cleanup_session(&self, _session_id: &str) -> ScanResult<usize> {
            Ok(0)
        }
    }

    fn state_with_counting_service() -> (AppState, Arc<CountingService>) {
        let service = Arc::new(CountingService::default());
        let (state, _events) = AppState::with_service(
            Config::default(),
            Session::generate(),
            service.clone(),
        );
        (state, service)
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn oversized_upload_never_reaches_the_network() {
        let (state, service) = state_with_counting_service();

        let mut bytes = png_bytes(4, 4);
        bytes.resize(12 * 1024 * 1024, 0);

        let err = state.upload_image(&bytes, "shelf.png").await.unwrap_err();
        assert!(matches!(err, ScanError::TooLarge { .. }));
        assert_eq!(service.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upload_image_reports_both_sizes() {
        let (state, service) = state_with_counting_service();

        let bytes = png_bytes(640, 480);
        let uploaded = state.upload_image(&bytes, "shelf.png").await.unwrap();

        assert_eq!(service.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(uploaded.original_size, bytes.len());
        assert!(uploaded.uploaded_size > 0);
        assert_eq!(uploaded.mime, "image/jpeg");
        assert_eq!(uploaded.session_id, state.session.id());
    }
}
