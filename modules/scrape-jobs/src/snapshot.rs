use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scrapy_client::{Job, JobId, JobStatus};
use serde::Serialize;
use tokio::sync::mpsc;

/// A job as observed at one instant, plus where the observer was in its poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub job: Job,
    /// 1-based poll attempt; 0 for snapshots taken while submitting or starting.
    pub attempt: u32,
    /// Time since polling began.
    pub elapsed: Duration,
    pub observed_at: DateTime<Utc>,
}

impl JobSnapshot {
    pub fn new(job: Job, attempt: u32, elapsed: Duration) -> Self {
        Self {
            job,
            attempt,
            elapsed,
            observed_at: Utc::now(),
        }
    }

    /// Snapshot of a job seen outside the poll loop.
    pub fn initial(job: Job) -> Self {
        Self::new(job, 0, Duration::ZERO)
    }

    pub fn job_id(&self) -> JobId {
        self.job.id
    }

    pub fn status(&self) -> JobStatus {
        self.job.status
    }

    pub fn is_terminal(&self) -> bool {
        self.job.status.is_terminal()
    }

    pub fn progress_percentage(&self) -> f64 {
        self.job.progress_percentage()
    }
}

/// Receives every snapshot of a job, in order.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn deliver(&self, snapshot: &JobSnapshot);
}

/// Discards snapshots.
pub struct NoopSink;

#[async_trait]
impl SnapshotSink for NoopSink {
    async fn deliver(&self, _snapshot: &JobSnapshot) {}
}

/// Adapts a plain callback, e.g. a progress-bar update.
pub struct FnSink<F>(pub F);

#[async_trait]
impl<F> SnapshotSink for FnSink<F>
where
    F: Fn(&JobSnapshot) + Send + Sync,
{
    async fn deliver(&self, snapshot: &JobSnapshot) {
        (self.0)(snapshot)
    }
}

#[async_trait]
impl SnapshotSink for mpsc::UnboundedSender<JobSnapshot> {
    async fn deliver(&self, snapshot: &JobSnapshot) {
        // A dropped receiver just means nobody is watching any more.
        let _ = self.send(snapshot.clone());
    }
}
