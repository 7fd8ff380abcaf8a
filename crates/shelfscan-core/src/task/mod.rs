//! Recognition task lifecycle.
//!
//! Architecture:
//!
//! ```text
//! UI layer                         TaskOrchestrator
//! ────────                         ────────────────
//! start(file_id, session_id) ───►  Idle → Submitting ──create_task──► Polling
//!                                                                        │
//!                                              sleep(poll_interval)      │
//!                                              then fetch_task, once  ◄──┘
//!                                              per round trip
//!                                                    │
//!                      Completed ◄── publish sink ───┤
//! TaskEvent stream ◄── Failed    ◄───────────────────┤
//!                      Cancelled ◄───────────────────┘
//! ```
//!
//! The orchestrator is the sole mutator of task state; the UI observes it
//! through the event stream and [`TaskOrchestrator::snapshot`], and reads
//! completed results from the [`ResultSink`].

mod orchestrator;
mod progress;
mod sink;
mod types;

pub use orchestrator::TaskOrchestrator;
pub use progress::progress_title;
pub use sink::ResultSink;
pub use types::{
    Book, OrchestratorSnapshot, Phase, RecognitionResult, TaskEvent, TaskSnapshot, TaskStatus,
};
