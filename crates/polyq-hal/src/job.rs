//! Batch job bookkeeping.
//!
//! A job is one submitted [`CircuitSpec`](polyq_ir::CircuitSpec) batch. It
//! runs once and ends in exactly one terminal state:
//!
//! ```text
//!   submit() ──→ Queued ──→ Running ──┬──→ Completed
//!                                     ├──→ Failed(reason)
//!                                     └──→ Cancelled
//! ```

use chrono::{DateTime, TimeDelta, Utc};

/// Backend-assigned job handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a batch job is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed(String),
    Cancelled,
}

impl JobStatus {
    /// `Completed`, `Failed` or `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => f.write_str("queued"),
            JobStatus::Running => f.write_str("running"),
            JobStatus::Completed => f.write_str("completed"),
            JobStatus::Failed(reason) => write!(f, "failed: {reason}"),
            JobStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// One submitted batch.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Batch rows in the submitted circuit.
    pub rows: usize,
    /// Shots per row; `None` for exact execution.
    pub shots: Option<u32>,
    pub submitted_at: DateTime<Utc>,
    /// Set once, on the first terminal transition.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// A queued job stamped with the current time.
    pub fn new(id: JobId, rows: usize, shots: Option<u32>) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            rows,
            shots,
            submitted_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to `status`. Terminal states are final: returns `false` and
    /// leaves the job untouched when it has already finished.
    pub fn transition(&mut self, status: JobStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if status.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        self.status = status;
        true
    }

    /// Finished more than `retention` before `now`.
    pub fn expired(&self, now: DateTime<Utc>, retention: TimeDelta) -> bool {
        self.finished_at
            .is_some_and(|finished| now.signed_duration_since(finished) > retention)
    }
}
