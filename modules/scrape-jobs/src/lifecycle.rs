//! Submit → start → poll → fetch results, as one call.
//!
//! Every platform page drives jobs through this instead of keeping its own
//! polling loop. Progress reaches the caller through a [`SnapshotSink`];
//! failures stop the run and come back as the step's own error. Nothing
//! is retried here.

use std::sync::Arc;

use scrapy_client::{JobId, JobStatus, ScrapeResult, ScrapyError};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::JobApi;
use crate::error::{JobError, Result};
use crate::poller::{self, PollConfig, PollRegistry, Poller};
use crate::request::JobRequest;
use crate::results::ResultFetcher;
use crate::snapshot::{JobSnapshot, SnapshotSink};
use crate::start::JobStarter;
use crate::submit::JobSubmitter;

/// How a run ended. Failed and cancelled jobs are outcomes, not errors.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub snapshot: JobSnapshot,
    /// Present only when the job completed.
    pub results: Option<Vec<ScrapeResult>>,
}

impl JobOutcome {
    pub fn job_id(&self) -> JobId {
        self.snapshot.job_id()
    }

    pub fn status(&self) -> JobStatus {
        self.snapshot.status()
    }

    pub fn succeeded(&self) -> bool {
        self.status() == JobStatus::Completed
    }
}

#[derive(Clone)]
pub struct JobLifecycle {
    api: Arc<dyn JobApi>,
    submitter: JobSubmitter,
    starter: JobStarter,
    poller: Poller,
    fetcher: ResultFetcher,
}

impl JobLifecycle {
    pub fn new(api: Arc<dyn JobApi>) -> Self {
        Self::with_registry(api, PollRegistry::new())
    }

    /// Share a poll registry with other lifecycles talking to the same backend.
    pub fn with_registry(api: Arc<dyn JobApi>, registry: PollRegistry) -> Self {
        Self {
            submitter: JobSubmitter::new(api.clone()),
            starter: JobStarter::new(api.clone()),
            poller: Poller::new(api.clone(), registry),
            fetcher: ResultFetcher::new(api.clone()),
            api,
        }
    }

    pub fn submitter(&self) -> &JobSubmitter {
        &self.submitter
    }

    pub fn starter(&self) -> &JobStarter {
        &self.starter
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn fetcher(&self) -> &ResultFetcher {
        &self.fetcher
    }

    pub async fn run_job(
        &self,
        request: &JobRequest,
        config: PollConfig,
        on_update: &dyn SnapshotSink,
    ) -> Result<JobOutcome> {
        self.run_job_with(request, config, on_update, CancellationToken::new())
            .await
    }

    /// Run a job to its end. Once the job exists, cancelling `cancel` asks
    /// the backend to cancel it and yields `PollCancelled`. A run cancelled
    /// before the start call never sends it.
    pub async fn run_job_with(
        &self,
        request: &JobRequest,
        config: PollConfig,
        on_update: &dyn SnapshotSink,
        cancel: CancellationToken,
    ) -> Result<JobOutcome> {
        let created = self.submitter.submit(request).await?;
        let job_id = created.id;
        on_update.deliver(&JobSnapshot::initial(created)).await;

        // Submission is never interrupted: a dropped create could leave a job
        // we hold no id for. Once the id is known a cancel stops the run.
        let started = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(poller::cancelled(&*self.api, job_id, &config).await);
            }
            started = self.starter.start(job_id) => started?,
        };
        let snapshot = JobSnapshot::initial(started);
        on_update.deliver(&snapshot).await;

        // Fast jobs can settle before the first poll.
        let snapshot = if snapshot.is_terminal() {
            snapshot
        } else {
            self.poller
                .watch_with(job_id, config, cancel)?
                .run_from(on_update, Some(snapshot))
                .await?
        };

        let results = match snapshot.status() {
            JobStatus::Completed => Some(self.fetcher.fetch_results(job_id).await?),
            _ => None,
        };

        info!(
            job_id,
            status = %snapshot.status(),
            results = results.as_ref().map(Vec::len),
            "Scrape job finished"
        );
        Ok(JobOutcome { snapshot, results })
    }

    /// Ask the backend to cancel a job outside of any poll, e.g. a stop
    /// button on a job list. Cancelling a job that already ended is a no-op.
    pub async fn cancel(&self, job_id: JobId) -> Result<()> {
        match self.api.cancel_job(job_id).await {
            Ok(()) => {
                info!(job_id, "Scrape job cancelled");
                Ok(())
            }
            Err(ScrapyError::Network(msg)) => Err(JobError::Network(msg)),
            Err(err) if err.is_not_found() => Err(JobError::JobNotFound(job_id)),
            Err(err) => {
                let job = self
                    .api
                    .get_job(job_id)
                    .await
                    .map_err(|e| JobError::for_job(job_id, e))?;
                if job.is_terminal() {
                    info!(job_id, status = %job.status, "Job already ended, nothing to cancel");
                    return Ok(());
                }
                Err(err.into())
            }
        }
    }
}
