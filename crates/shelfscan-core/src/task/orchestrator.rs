//! Recognition task lifecycle manager.
//!
//! Owns the full lifecycle of one in-flight task: submission, status
//! polling, projection of progress, and the terminal transitions. The
//! single most important property: at most one task is ever in flight per
//! orchestrator, enforced by the phase check before the first await in
//! [`TaskOrchestrator::start`].
//!
//! Polling is fixed-delay, not fixed-rate: each status fetch is scheduled
//! only after the previous one resolves, so a slow response never overlaps
//! a second in-flight fetch. Cancellation is cooperative; an in-flight
//! fetch is not aborted, its response is discarded by the stale guard
//! (task id + phase re-checked under the lock before any transition).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::api::RecognitionService;
use crate::config::Config;
use crate::error::{ScanError, ScanResult};

use super::sink::ResultSink;
use super::types::{OrchestratorSnapshot, Phase, TaskEvent, TaskStatus};

const EVENT_CHANNEL_CAPACITY: usize = 32;
const INITIAL_STAGE: &str = "Preparing to start recognition...";

/// Drives one recognition task at a time from submission to a terminal
/// state, emitting [`TaskEvent`]s for the embedding UI.
pub struct TaskOrchestrator {
    service: Arc<dyn RecognitionService>,
    sink: ResultSink,
    state: Arc<Mutex<TaskState>>,
    events: mpsc::Sender<TaskEvent>,
    poll_interval: Duration,
    max_status_checks: Option<u32>,
}

#[derive(Debug)]
struct TaskState {
    phase: Phase,
    task_id: Option<String>,
    progress: u8,
    current_stage: String,
    error: Option<ScanError>,
    /// Stops the polling loop; replaced with a fresh token on every start
    cancel: CancellationToken,
    /// Set when cancel() arrives while the submission call is in flight
    cancel_requested: bool,
}

impl Default for TaskState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            task_id: None,
            progress: 0,
            current_stage: String::new(),
            error: None,
            cancel: CancellationToken::new(),
            cancel_requested: false,
        }
    }
}

impl TaskOrchestrator {
    /// Create an orchestrator publishing completed results to `sink`.
    /// Returns the receiver for the task events it emits.
    pub fn new(
        service: Arc<dyn RecognitionService>,
        sink: ResultSink,
        config: &Config,
    ) -> (Self, mpsc::Receiver<TaskEvent>) {
        let (events, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (
            Self {
                service,
                sink,
                state: Arc::new(Mutex::new(TaskState::default())),
                events,
                poll_interval: config.poll_interval,
                max_status_checks: config.max_status_checks,
            },
            rx,
        )
    }

    /// Submit a recognition task for an uploaded file and begin polling.
    ///
    /// Fails with a conflict if any task is already in flight (or finished
    /// but not yet reset); the phase flips to Submitting before the first
    /// await, so concurrent calls produce exactly one task-creation call.
    /// Returns the server-assigned task id.
    pub async fn start(&self, file_id: &str, session_id: &str) -> ScanResult<String> {
        {
            let mut state = self.state.lock().await;
            if state.phase != Phase::Idle {
                return Err(ScanError::conflict(
                    "A recognition task is already in flight",
                ));
            }
            state.phase = Phase::Submitting;
            state.task_id = None;
            state.progress = 0;
            state.current_stage = INITIAL_STAGE.to_string();
            state.error = None;
            state.cancel_requested = false;
            state.cancel = CancellationToken::new();
        }

        tracing::info!(file_id = %file_id, "submitting recognition task");
        let task_id = match self.service.create_task(file_id, session_id).await {
            Ok(task_id) => task_id,
            Err(e) => {
                let mut state = self.state.lock().await;
                if state.phase == Phase::Submitting {
                    state.phase = Phase::Idle;
                }
                return Err(e);
            }
        };

        let mut state = self.state.lock().await;
        if state.cancel_requested {
            // cancel() arrived while the submission was in flight; the task
            // exists now, so acknowledge it before it is ever polled.
            drop(state);
            if let Err(e) = self.service.cancel_task(&task_id).await {
                tracing::warn!(task_id = %task_id, error = %e, "failed to cancel freshly created task");
            }
            let mut state = self.state.lock().await;
            if state.phase == Phase::Submitting {
                state.phase = Phase::Cancelled;
            }
            drop(state);
            let _ = self.events.send(TaskEvent::Cancelled).await;
            return Ok(task_id);
        }
        if state.phase != Phase::Submitting {
            // reset() raced the submission; the created task is abandoned
            drop(state);
            tracing::debug!(task_id = %task_id, "orchestrator reset during submission, abandoning task");
            let service = self.service.clone();
            let abandoned = task_id.clone();
            tokio::spawn(async move {
                if let Err(e) = service.cancel_task(&abandoned).await {
                    tracing::debug!(task_id = %abandoned, error = %e, "abandoned-task cancel failed");
                }
            });
            return Ok(task_id);
        }

        state.task_id = Some(task_id.clone());
        state.phase = Phase::Polling;
        let cancel = state.cancel.clone();
        drop(state);

        tracing::info!(task_id = %task_id, "recognition task created, polling for status");
        self.spawn_poll_loop(task_id.clone(), cancel);
        Ok(task_id)
    }

    /// Cancel the task currently in flight.
    ///
    /// In Polling, issues the remote cancellation and, if the task is still
    /// current when it succeeds, transitions to Cancelled; any status
    /// response still in flight for that task is then discarded. During
    /// Submitting the request is recorded and honored as soon as the
    /// submission resolves. In any other phase there is nothing to cancel.
    pub async fn cancel(&self) -> ScanResult<()> {
        let task_id = {
            let mut state = self.state.lock().await;
            match state.phase {
                Phase::Submitting => {
                    state.cancel_requested = true;
                    return Ok(());
                }
                Phase::Polling => state.task_id.clone().unwrap_or_default(),
                _ => {
                    return Err(ScanError::conflict("No recognition task is in flight"));
                }
            }
        };

        self.service.cancel_task(&task_id).await?;

        let mut state = self.state.lock().await;
        if state.phase == Phase::Polling && state.task_id.as_deref() == Some(task_id.as_str()) {
            state.phase = Phase::Cancelled;
            state.cancel.cancel();
            drop(state);
            tracing::info!(task_id = %task_id, "recognition task cancelled");
            let _ = self.events.send(TaskEvent::Cancelled).await;
        }
        Ok(())
    }

    /// Return to Idle from any phase. Stops polling, drops the task
    /// projection and clears the result sink. Safe to call repeatedly.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.cancel.cancel();
        state.phase = Phase::Idle;
        state.task_id = None;
        state.progress = 0;
        state.current_stage.clear();
        state.error = None;
        state.cancel_requested = false;
        drop(state);
        self.sink.clear().await;
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    /// Point-in-time view for the UI.
    pub async fn snapshot(&self) -> OrchestratorSnapshot {
        let state = self.state.lock().await;
        OrchestratorSnapshot {
            phase: state.phase,
            task_id: state.task_id.clone(),
            progress: state.progress,
            current_stage: state.current_stage.clone(),
            error: state.error.clone(),
        }
    }

    fn spawn_poll_loop(&self, task_id: String, cancel: CancellationToken) {
        let service = self.service.clone();
        let state = self.state.clone();
        let sink = self.sink.clone();
        let events = self.events.clone();
        let interval = self.poll_interval;
        let max_checks = self.max_status_checks;

        tokio::spawn(async move {
            let mut checks: u32 = 0;
            loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        tracing::debug!(task_id = %task_id, "polling loop stopped");
                        return;
                    }

                    _ = tokio::time::sleep(interval) => {}
                }

                let fetched = service.fetch_task(&task_id).await;
                checks += 1;

                let mut guard = state.lock().await;
                if guard.phase != Phase::Polling
                    || guard.task_id.as_deref() != Some(task_id.as_str())
                {
                    // The orchestrator moved on (cancel or reset) while this
                    // fetch was in flight; the response is stale.
                    tracing::debug!(task_id = %task_id, "discarding stale status response");
                    return;
                }

                match fetched {
                    Ok(snapshot) => match snapshot.status {
                        TaskStatus::Pending | TaskStatus::Processing => {
                            guard.progress = snapshot.progress;
                            guard.current_stage = snapshot.current_stage.clone();

                            if let Some(limit) = max_checks {
                                if checks >= limit {
                                    let error = ScanError::transport(format!(
                                        "Task did not finish within {limit} status checks"
                                    ));
                                    guard.phase = Phase::Failed;
                                    guard.error = Some(error.clone());
                                    drop(guard);
                                    tracing::warn!(task_id = %task_id, "giving up on task after {checks} checks");
                                    let _ = events.send(TaskEvent::Failed { error }).await;
                                    return;
                                }
                            }

                            drop(guard);
                            let _ = events
                                .send(TaskEvent::Progress {
                                    progress: snapshot.progress,
                                    stage: snapshot.current_stage,
                                })
                                .await;
                        }
                        TaskStatus::Completed => {
                            let result = snapshot.result.unwrap_or_default();
                            // Publish before the phase flips so a consumer
                            // that observes Completed always finds the books
                            sink.publish(result.clone()).await;
                            guard.progress = 100;
                            guard.current_stage = snapshot.current_stage.clone();
                            guard.phase = Phase::Completed;
                            drop(guard);
                            tracing::info!(
                                task_id = %task_id,
                                books = result.books.len(),
                                "recognition completed"
                            );
                            let _ = events.send(TaskEvent::Completed { result }).await;
                            return;
                        }
                        TaskStatus::Failed => {
                            let error = ScanError::service(
                                snapshot
                                    .error
                                    .unwrap_or_else(|| "Recognition failed".to_string()),
                            );
                            guard.phase = Phase::Failed;
                            guard.error = Some(error.clone());
                            drop(guard);
                            tracing::warn!(task_id = %task_id, error = %error, "recognition task failed");
                            let _ = events.send(TaskEvent::Failed { error }).await;
                            return;
                        }
                        TaskStatus::Cancelled => {
                            guard.phase = Phase::Cancelled;
                            drop(guard);
                            tracing::info!(task_id = %task_id, "task reported cancelled by the service");
                            let _ = events.send(TaskEvent::Cancelled).await;
                            return;
                        }
                    },
                    Err(error) => {
                        // Transport and service errors alike end the task;
                        // the error's code tells the caller which it was
                        guard.phase = Phase::Failed;
                        guard.error = Some(error.clone());
                        drop(guard);
                        tracing::warn!(task_id = %task_id, error = %error, "status check failed, polling stopped");
                        let _ = events.send(TaskEvent::Failed { error }).await;
                        return;
                    }
                }
            }
        });
    }
}
