//! Task and result types for the recognition pipeline.

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Server-reported status of a recognition task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Completed, failed and cancelled tasks are never polled again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Orchestrator lifecycle phase.
///
/// `Idle` is the only phase a new submission is accepted from; it is
/// reachable from every other phase via reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
    Cancelled,
}

/// One status fetch, as reported by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub current_stage: String,
    /// Present iff `status` is completed; never partial
    pub result: Option<RecognitionResult>,
    /// Present iff `status` is failed
    pub error: Option<String>,
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
}

/// The complete outcome of one recognition task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Recognized books, in the order the service returned them
    pub books: Vec<Book>,
    #[serde(default)]
    pub total_books: usize,
    /// Server-side processing time in seconds
    #[serde(default)]
    pub processing_time: f64,
}

/// A single recognized book. Immutable once received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Recognition confidence, 0-100
    #[serde(default)]
    pub confidence: u8,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub pubdate: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

/// Events the orchestrator emits for the embedding UI.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TaskEvent {
    /// The task is still running; projection updated
    Progress { progress: u8, stage: String },
    /// Terminal: the result has been published to the sink
    Completed { result: RecognitionResult },
    /// Terminal: the task failed, or the service became unreachable
    Failed { error: ScanError },
    /// Terminal: the task was cancelled
    Cancelled,
}

/// Point-in-time view of the orchestrator for the UI.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorSnapshot {
    pub phase: Phase,
    pub task_id: Option<String>,
    pub progress: u8,
    pub current_stage: String,
    pub error: Option<ScanError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_snake_case() {
        let status: TaskStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(status, TaskStatus::Processing);
        assert_eq!(serde_json::to_string(&TaskStatus::Cancelled).unwrap(), "\"cancelled\"");
    }

    #[test]
    fn terminal_statuses() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Processing.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn book_tolerates_missing_fields() {
        let book: Book = serde_json::from_str(r#"{"title": "Rust in Action", "confidence": 92}"#).unwrap();
        assert_eq!(book.title.as_deref(), Some("Rust in Action"));
        assert_eq!(book.confidence, 92);
        assert!(book.isbn.is_none());
        assert!(book.rating.is_none());
    }
}
