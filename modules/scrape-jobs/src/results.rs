use std::sync::Arc;

use scrapy_client::{JobId, ScrapeResult};
use tracing::info;

use crate::api::JobApi;
use crate::error::{JobError, Result};

/// Retrieves a finished job's results in a single request.
///
/// Callers only invoke this after observing `completed`; the lifecycle
/// enforces that, so it isn't checked again here.
#[derive(Clone)]
pub struct ResultFetcher {
    api: Arc<dyn JobApi>,
}

impl ResultFetcher {
    pub fn new(api: Arc<dyn JobApi>) -> Self {
        Self { api }
    }

    pub async fn fetch_results(&self, job_id: JobId) -> Result<Vec<ScrapeResult>> {
        let results = self
            .api
            .get_results(job_id)
            .await
            .map_err(|err| JobError::for_job(job_id, err))?;

        let failed = results.iter().filter(|r| !r.success).count();
        info!(job_id, count = results.len(), failed, "Fetched scrape results");
        Ok(results)
    }
}
