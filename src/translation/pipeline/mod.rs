/*!
 * Job orchestration.
 *
 * `admission` bounds how many documents the process works on at once;
 * `orchestrator` drives one document job through extraction, translation,
 * matching and application.
 */

pub mod admission;
pub mod orchestrator;

pub use admission::{AdmissionGate, AdmissionPermit};
pub use orchestrator::{
    CancellationFlag, JobState, JobSummary, LogProgress, Orchestrator, ProgressSink,
};
