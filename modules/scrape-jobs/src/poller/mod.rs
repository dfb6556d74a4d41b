//! Watches a remote job until it settles, the budget runs out, or the caller
//! cancels.
//!
//! `pending` and `running` are the only states the loop keeps polling
//! through. The first terminal snapshot ends the loop and nothing is
//! emitted after it.

pub mod budget;
pub mod registry;

pub use budget::PollConfig;
pub use registry::{PollRegistry, PollSlot};

use std::sync::Arc;
use std::time::Duration;

use scrapy_client::{JobId, JobStatus};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::JobApi;
use crate::error::{JobError, Result};
use crate::snapshot::{JobSnapshot, SnapshotSink};

/// Creates poll sessions and enforces one loop per job.
#[derive(Clone)]
pub struct Poller {
    api: Arc<dyn JobApi>,
    registry: PollRegistry,
}

impl Poller {
    pub fn new(api: Arc<dyn JobApi>, registry: PollRegistry) -> Self {
        Self { api, registry }
    }

    pub fn registry(&self) -> &PollRegistry {
        &self.registry
    }

    /// Claim the job's poll slot. Fails at once with `AlreadyPolling` if
    /// another session holds it.
    pub fn watch(&self, job_id: JobId, config: PollConfig) -> Result<PollSession> {
        self.watch_with(job_id, config, CancellationToken::new())
    }

    /// Like [`watch`](Self::watch), cancelled through a caller-owned token.
    pub fn watch_with(
        &self,
        job_id: JobId,
        config: PollConfig,
        cancel: CancellationToken,
    ) -> Result<PollSession> {
        let slot = self.registry.claim(job_id)?;
        let (latest, _) = watch::channel(None);
        Ok(PollSession {
            api: self.api.clone(),
            config,
            slot,
            cancel,
            latest,
        })
    }

    /// Claim and run in one step.
    pub async fn poll(
        &self,
        job_id: JobId,
        config: PollConfig,
        sink: &dyn SnapshotSink,
    ) -> Result<JobSnapshot> {
        self.watch(job_id, config)?.run(sink).await
    }
}

/// One claimed poll loop, not yet running.
pub struct PollSession {
    api: Arc<dyn JobApi>,
    config: PollConfig,
    slot: PollSlot,
    cancel: CancellationToken,
    latest: watch::Sender<Option<JobSnapshot>>,
}

impl PollSession {
    pub fn job_id(&self) -> JobId {
        self.slot.job_id()
    }

    /// A handle for cancelling and observing this session from elsewhere.
    pub fn handle(&self) -> PollHandle {
        PollHandle {
            job_id: self.job_id(),
            cancel: self.cancel.clone(),
            latest: self.latest.subscribe(),
        }
    }

    /// Poll until terminal, out of budget, or cancelled.
    ///
    /// A terminal status (completed, failed or cancelled) is a normal return.
    /// The slot is released when this returns, however it returns.
    pub async fn run(self, sink: &dyn SnapshotSink) -> Result<JobSnapshot> {
        self.run_from(sink, None).await
    }

    /// Like [`run`](Self::run), for a job whose snapshot `seen` the caller
    /// already delivered. Reads older than `seen` are discarded as stale.
    pub async fn run_from(
        self,
        sink: &dyn SnapshotSink,
        seen: Option<JobSnapshot>,
    ) -> Result<JobSnapshot> {
        let PollSession {
            api,
            config,
            slot,
            cancel,
            latest,
        } = self;
        let job_id = slot.job_id();

        info!(
            job_id,
            interval_ms = config.interval.as_millis() as u64,
            max_duration_ms = config.max_duration.as_millis() as u64,
            "Polling scrape job"
        );

        let started = Instant::now();
        // Hard stop, even for a status fetch that never answers.
        let deadline = started + config.max_duration + config.interval;
        let mut attempts: u32 = 0;
        if seen.is_some() {
            latest.send_replace(seen.clone());
        }
        let mut last: Option<JobSnapshot> = seen;

        loop {
            attempts += 1;

            let job = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(&*api, job_id, &config).await),
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(gave_up(job_id, attempts, started.elapsed(), last));
                }
                fetched = api.get_job(job_id) => {
                    fetched.map_err(|err| JobError::for_job(job_id, err))?
                }
            };
            let elapsed = started.elapsed();
            let snapshot = JobSnapshot::new(job, attempts, elapsed);

            if cancel.is_cancelled() {
                return Err(cancelled(&*api, job_id, &config).await);
            }

            match last.as_ref() {
                Some(prev) if regressed(prev, &snapshot) => {
                    warn!(
                        job_id,
                        attempt = attempts,
                        processed_urls = snapshot.job.processed_urls,
                        previous = prev.job.processed_urls,
                        "Discarding stale job snapshot"
                    );
                }
                _ => {
                    debug!(
                        job_id,
                        attempt = attempts,
                        status = %snapshot.status(),
                        processed_urls = snapshot.job.processed_urls,
                        total_urls = snapshot.job.total_urls,
                        "Job snapshot"
                    );
                    sink.deliver(&snapshot).await;
                    latest.send_replace(Some(snapshot.clone()));

                    if snapshot.is_terminal() {
                        info!(
                            job_id,
                            status = %snapshot.status(),
                            attempts,
                            "Job reached terminal state"
                        );
                        return Ok(snapshot);
                    }
                    last = Some(snapshot);
                }
            }

            if config.exhausted(attempts, elapsed) {
                return Err(gave_up(job_id, attempts, elapsed, last));
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(&*api, job_id, &config).await),
                _ = tokio::time::sleep(config.interval) => {}
            }
        }
    }
}

/// Cancels and observes a running poll session. Cheap to clone.
#[derive(Clone)]
pub struct PollHandle {
    job_id: JobId,
    cancel: CancellationToken,
    latest: watch::Receiver<Option<JobSnapshot>>,
}

impl PollHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Stop polling. Idempotent, and a no-op once the session has ended.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Most recent snapshot emitted, if any.
    pub fn latest(&self) -> Option<JobSnapshot> {
        self.latest.borrow().clone()
    }

    /// Change-notified view of the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<JobSnapshot>> {
        self.latest.clone()
    }
}

/// A non-terminal read that moves progress backwards is older than what we
/// already showed.
fn regressed(prev: &JobSnapshot, next: &JobSnapshot) -> bool {
    if next.is_terminal() {
        return false;
    }
    next.job.processed_urls < prev.job.processed_urls
        || (prev.status() == JobStatus::Running && next.status() == JobStatus::Pending)
}

fn gave_up(
    job_id: JobId,
    attempts: u32,
    elapsed: Duration,
    last: Option<JobSnapshot>,
) -> JobError {
    warn!(
        job_id,
        attempts,
        elapsed_ms = elapsed.as_millis() as u64,
        "Poll budget exhausted, leaving job running"
    );
    JobError::PollTimeout {
        job_id,
        attempts,
        elapsed,
        last: last.map(Box::new),
    }
}

/// Best-effort remote cancel, bounded by one poll interval so the caller
/// hears back promptly.
pub(crate) async fn cancelled(api: &dyn JobApi, job_id: JobId, config: &PollConfig) -> JobError {
    info!(job_id, "Poll cancelled, asking backend to cancel job");
    match tokio::time::timeout(config.interval, api.cancel_job(job_id)).await {
        Ok(Ok(())) => debug!(job_id, "Backend acknowledged cancel"),
        Ok(Err(err)) => warn!(job_id, error = %err, "Remote cancel failed"),
        Err(_) => warn!(job_id, "Remote cancel timed out"),
    }
    JobError::PollCancelled(job_id)
}
