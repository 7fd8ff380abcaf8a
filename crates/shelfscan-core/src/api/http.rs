//! HTTP implementation of the recognition service contract.
//!
//! One shared `reqwest::Client` with a bounded per-request timeout and the
//! session id as a default header. Responses follow the service convention:
//! a JSON body carrying `success: true`, or `success: false`/an HTTP error
//! status with an `error` message.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ScanError, ScanResult};
use crate::prepare::PreparedImage;
use crate::task::{RecognitionResult, TaskSnapshot, TaskStatus};

use super::{RecognitionService, UploadedFile};

const UPLOAD_PATH: &str = "/api/upload";
const RECOGNIZE_PATH: &str = "/api/recognize";
const TASK_PATH: &str = "/api/task";
const CLEANUP_PATH: &str = "/api/cleanup";

const SESSION_HEADER: &str = "x-session-id";

/// Reqwest-backed [`RecognitionService`].
pub struct HttpRecognitionService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecognitionService {
    /// Build a client for the configured service, attaching the session id
    /// to every outgoing request.
    pub fn new(config: &Config, session_id: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            SESSION_HEADER,
            HeaderValue::from_str(session_id).context("Invalid session id")?,
        );

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RecognitionService for HttpRecognitionService {
    async fn upload(&self, image: &PreparedImage, session_id: &str) -> ScanResult<UploadedFile> {
        let part = Part::stream_with_length(
            Body::from(image.bytes.clone()),
            image.bytes.len() as u64,
        )
        .file_name(image.file_name.clone())
        .mime_str(image.mime)
        .map_err(|e| ScanError::internal(format!("Invalid upload MIME type: {e}")))?;

        let response = self
            .client
            .post(self.url(UPLOAD_PATH))
            .multipart(Form::new().part("image", part))
            .send()
            .await
            .map_err(transport)?;

        let body: UploadResponse = read_json(response).await?;
        uploaded_from(body, image, session_id)
    }

    async fn create_task(&self, file_id: &str, session_id: &str) -> ScanResult<String> {
        let response = self
            .client
            .post(self.url(RECOGNIZE_PATH))
            .json(&RecognizeRequest {
                file_id,
                session_id,
            })
            .send()
            .await
            .map_err(transport)?;

        let body: RecognizeResponse = read_json(response).await?;
        task_id_from(body)
    }

    async fn fetch_task(&self, task_id: &str) -> ScanResult<TaskSnapshot> {
        let response = self
            .client
            .get(format!("{}/{}", self.url(TASK_PATH), task_id))
            .send()
            .await
            .map_err(transport)?;

        let body: TaskStatusResponse = read_json(response).await?;
        snapshot_from(body)
    }

    async fn cancel_task(&self, task_id: &str) -> ScanResult<()> {
        let response = self
            .client
            .post(format!("{}/{}/cancel", self.url(TASK_PATH), task_id))
            .send()
            .await
            .map_err(transport)?;

        let body: AckResponse = read_json(response).await?;
        ack_from(body)
    }

    async fn cleanup_session(&self, session_id: &str) -> ScanResult<usize> {
        let response = self
            .client
            .post(self.url(CLEANUP_PATH))
            .json(&CleanupRequest { session_id })
            .send()
            .await
            .map_err(transport)?;

        let body: CleanupResponse = read_json(response).await?;
        removed_from(body)
    }
}

/// Map a reqwest failure to the error taxonomy. Anything that happened on
/// the wire is a transport failure; a body that arrived but would not
/// decode counts against the service.
fn transport(e: reqwest::Error) -> ScanError {
    if e.is_timeout() {
        ScanError::transport("Request timed out")
    } else if e.is_decode() {
        ScanError::service(format!("Malformed service response: {e}"))
    } else {
        ScanError::transport(e.to_string())
    }
}

/// Decode a response body, turning HTTP error statuses into service errors
/// carrying the server's `error` message when one is present.
async fn read_json<T: DeserializeOwned>(response: Response) -> ScanResult<T> {
    let status = response.status();
    if !status.is_success() {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body
                .error
                .unwrap_or_else(|| format!("Service returned HTTP {status}")),
            Err(_) => format!("Service returned HTTP {status}"),
        };
        return Err(ScanError::service(message));
    }

    response.json::<T>().await.map_err(transport)
}

fn uploaded_from(
    body: UploadResponse,
    image: &PreparedImage,
    session_id: &str,
) -> ScanResult<UploadedFile> {
    if !body.success {
        return Err(ScanError::service(
            body.error.unwrap_or_else(|| "Upload rejected".to_string()),
        ));
    }
    let file_id = body
        .file_id
        .ok_or_else(|| ScanError::service("Upload response missing file_id"))?;

    Ok(UploadedFile {
        file_id,
        session_id: body
            .session_id
            .unwrap_or_else(|| session_id.to_string()),
        original_size: image.original_size,
        uploaded_size: image.encoded_size,
        mime: image.mime.to_string(),
    })
}

fn task_id_from(body: RecognizeResponse) -> ScanResult<String> {
    if !body.success {
        return Err(ScanError::service(
            body.error
                .unwrap_or_else(|| "Failed to start recognition".to_string()),
        ));
    }
    body.task_id
        .ok_or_else(|| ScanError::service("Recognition response missing task_id"))
}

fn snapshot_from(body: TaskStatusResponse) -> ScanResult<TaskSnapshot> {
    if !body.success {
        return Err(ScanError::service(
            body.error
                .unwrap_or_else(|| "Task status unavailable".to_string()),
        ));
    }
    let status = body
        .status
        .ok_or_else(|| ScanError::service("Task status response missing status"))?;

    Ok(TaskSnapshot {
        task_id: body.task_id.unwrap_or_default(),
        status,
        progress: body.progress.unwrap_or(0),
        current_stage: body.current_stage.unwrap_or_default(),
        result: body.result,
        error: body.error,
        created_at: body.created_at,
        completed_at: body.completed_at,
    })
}

fn ack_from(body: AckResponse) -> ScanResult<()> {
    if !body.success {
        return Err(ScanError::service(
            body.error
                .unwrap_or_else(|| "Request rejected".to_string()),
        ));
    }
    Ok(())
}

fn removed_from(body: CleanupResponse) -> ScanResult<usize> {
    if !body.success {
        return Err(ScanError::service(
            body.error.unwrap_or_else(|| "Cleanup failed".to_string()),
        ));
    }
    Ok(body.deleted_files.unwrap_or_default().len())
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    file_id: &'a str,
    session_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CleanupRequest<'a> {
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    file_id: Option<String>,
    session_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    success: bool,
    task_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    #[serde(default)]
    success: bool,
    task_id: Option<String>,
    status: Option<TaskStatus>,
    progress: Option<u8>,
    current_stage: Option<String>,
    result: Option<RecognitionResult>,
    error: Option<String>,
    created_at: Option<String>,
    completed_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CleanupResponse {
    #[serde(default)]
    success: bool,
    deleted_files: Option<Vec<String>>,
    error: Option<String>,
}
