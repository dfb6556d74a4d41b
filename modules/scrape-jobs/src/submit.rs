use std::sync::Arc;

use scrapy_client::{Job, JobStatus};
use tracing::info;

use crate::api::JobApi;
use crate::error::{JobError, Result};
use crate::request::JobRequest;

/// Creates jobs on the backend. Never retries.
#[derive(Clone)]
pub struct JobSubmitter {
    api: Arc<dyn JobApi>,
}

impl JobSubmitter {
    pub fn new(api: Arc<dyn JobApi>) -> Self {
        Self { api }
    }

    /// Validate locally, then create the job. Returns the job in `pending`.
    pub async fn submit(&self, request: &JobRequest) -> Result<Job> {
        let body = request.validate()?;

        info!(
            platform = %body.platform,
            project_id = body.project_id,
            urls = body.target_urls.len(),
            num_of_posts = body.num_of_posts,
            "Submitting scrape job"
        );

        let job = self.api.create_job(&body).await?;

        if job.id <= 0 {
            return Err(JobError::Server {
                status: 200,
                message: format!("created job has no usable id ({})", job.id),
            });
        }
        if job.status != JobStatus::Pending {
            return Err(JobError::Server {
                status: 200,
                message: format!("created job {} is {}, expected pending", job.id, job.status),
            });
        }

        info!(job_id = job.id, "Scrape job created");
        Ok(job)
    }
}
