use std::sync::Arc;

use scrapy_client::{Job, JobId, JobStatus, ScrapyError, StartResponse};
use tracing::{debug, info};

use crate::api::JobApi;
use crate::error::{JobError, Result};

/// Issues the start command for created jobs.
#[derive(Clone)]
pub struct JobStarter {
    api: Arc<dyn JobApi>,
}

impl JobStarter {
    pub fn new(api: Arc<dyn JobApi>) -> Self {
        Self { api }
    }

    /// Start a job, treating "already started" as success.
    ///
    /// A second start (double click, two tabs) returns the job as it is now
    /// instead of failing.
    pub async fn start(&self, job_id: JobId) -> Result<Job> {
        match self.try_start(job_id).await {
            Err(JobError::JobAlreadyStarted(job)) => {
                info!(job_id, status = %job.status, "Job already started, nothing to do");
                Ok(*job)
            }
            other => other,
        }
    }

    /// Start a job, reporting `JobAlreadyStarted` when the backend refused
    /// because the job had left `pending`.
    pub async fn try_start(&self, job_id: JobId) -> Result<Job> {
        let rejection = match self.api.start_job(job_id).await {
            Ok(StartResponse::Job(job)) => {
                info!(job_id, status = %job.status, "Scrape job started");
                return Ok(*job);
            }
            Ok(StartResponse::Ack(ack)) => {
                debug!(job_id, message = ?ack.message, "Start acknowledged");
                let job = self.current(job_id).await?;
                info!(job_id, status = %job.status, "Scrape job started");
                return Ok(job);
            }
            // Accepted with a body we don't recognise; the job itself is the truth.
            Err(ScrapyError::Parse(msg)) => {
                debug!(job_id, error = %msg, "Start accepted with unreadable body");
                return self.current(job_id).await;
            }
            Err(ScrapyError::Network(msg)) => return Err(JobError::Network(msg)),
            Err(err) if err.is_not_found() => return Err(JobError::JobNotFound(job_id)),
            Err(err) => err,
        };

        // The backend folds "not found" and "already running" into a 400,
        // so look at the job to tell them apart.
        let job = self.current(job_id).await?;
        if job.status == JobStatus::Pending {
            return Err(rejection.into());
        }
        Err(JobError::JobAlreadyStarted(Box::new(job)))
    }

    async fn current(&self, job_id: JobId) -> Result<Job> {
        self.api
            .get_job(job_id)
            .await
            .map_err(|err| JobError::for_job(job_id, err))
    }
}
