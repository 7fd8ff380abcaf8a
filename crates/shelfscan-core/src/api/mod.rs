//! Remote recognition service boundary.
//!
//! The orchestrator and the upload path talk to the service exclusively
//! through [`RecognitionService`], so tests can substitute an in-memory
//! fake for the HTTP client in [`http`].

pub mod http;

pub use http::HttpRecognitionService;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ScanResult;
use crate::prepare::PreparedImage;
use crate::task::TaskSnapshot;

/// A successfully uploaded image, identified by a server-assigned handle.
///
/// Superseded, never mutated, by a later upload; the orchestrator owns the
/// current `file_id` from `start()` until the next terminal state or reset.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub file_id: String,
    /// Session the server filed the upload under (echoes ours)
    pub session_id: String,
    /// Byte size of the user's original file
    pub original_size: usize,
    /// Byte size of the payload actually sent
    pub uploaded_size: usize,
    pub mime: String,
}

/// Operations the remote recognition service exposes.
///
/// Each method performs exactly one network call and never retries;
/// transport failures map to `ScanError::Transport`, logical rejections
/// (`success: false`, HTTP error status) to `ScanError::Service`.
#[async_trait]
pub trait RecognitionService: Send + Sync {
    /// Upload a prepared image; returns the server-assigned file handle.
    async fn upload(&self, image: &PreparedImage, session_id: &str) -> ScanResult<UploadedFile>;

    /// Create a recognition task for an uploaded file; returns the task id.
    async fn create_task(&self, file_id: &str, session_id: &str) -> ScanResult<String>;

    /// Fetch the current state of a task.
    async fn fetch_task(&self, task_id: &str) -> ScanResult<TaskSnapshot>;

    /// Ask the service to cancel a task.
    async fn cancel_task(&self, task_id: &str) -> ScanResult<()>;

    /// Release the server-side temporary files scoped to a session.
    /// Returns the number of files removed.
    async fn cleanup_session(&self, session_id: &str) -> ScanResult<usize>;
}
