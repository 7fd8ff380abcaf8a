//! Result sink: the externally visible store of the latest completed scan.
//!
//! The orchestrator is the only writer. Export and detail views read the
//! current result after observing a completed transition; they never touch
//! task state.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::types::RecognitionResult;

/// Cloneable handle to the most recently completed recognition result.
#[derive(Clone, Default)]
pub struct ResultSink {
    inner: Arc<RwLock<Option<RecognitionResult>>>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored result. Called by the orchestrator on completion.
    pub async fn publish(&self, result: RecognitionResult) {
        *self.inner.write().await = Some(result);
    }

    /// The latest completed result, if any.
    pub async fn current(&self) -> Option<RecognitionResult> {
        self.inner.read().await.clone()
    }

    /// Drop the stored result. Called on orchestrator reset.
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::types::Book;

    #[tokio::test]
    async fn publish_then_read_then_clear() {
        let sink = ResultSink::new();
        assert!(sink.current().await.is_none());

        sink.publish(RecognitionResult {
            books: vec![Book {
                title: Some("The Rust Programming Language".to_string()),
                confidence: 97,
                ..Book::default()
            }],
            total_books: 1,
            processing_time: 4.2,
        })
        .await;

        let result = sink.current().await.unwrap();
        assert_eq!(result.books.len(), 1);
        assert_eq!(result.total_books, 1);

        sink.clear().await;
        assert!(sink.current().await.is_none());
    }

    #[tokio::test]
    async fn later_publish_supersedes() {
        let sink = ResultSink::new();
        sink.publish(RecognitionResult {
            total_books: 1,
            ..RecognitionResult::default()
        })
        .await;
        sink.publish(RecognitionResult {
            total_books: 3,
            ..RecognitionResult::default()
        })
        .await;
        assert_eq!(sink.current().await.unwrap().total_books, 3);
    }
}
