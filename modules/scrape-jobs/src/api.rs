//! The remote-job seam. Production uses [`ScrapyClient`]; tests use
//! `testing::MockJobApi`.

use async_trait::async_trait;
use scrapy_client::{
    CreateJobBody, Job, JobId, Result, ScrapeResult, ScrapyClient, StartResponse,
};

#[async_trait]
pub trait JobApi: Send + Sync {
    async fn create_job(&self, body: &CreateJobBody) -> Result<Job>;

    async fn start_job(&self, job_id: JobId) -> Result<StartResponse>;

    async fn get_job(&self, job_id: JobId) -> Result<Job>;

    async fn get_results(&self, job_id: JobId) -> Result<Vec<ScrapeResult>>;

    async fn cancel_job(&self, job_id: JobId) -> Result<()>;
}

#[async_trait]
impl JobApi for ScrapyClient {
    async fn create_job(&self, body: &CreateJobBody) -> Result<Job> {
        ScrapyClient::create_job(self, body).await
    }

    async fn start_job(&self, job_id: JobId) -> Result<StartResponse> {
        ScrapyClient::start_job(self, job_id).await
    }

    async fn get_job(&self, job_id: JobId) -> Result<Job> {
        ScrapyClient::get_job(self, job_id).await
    }

    async fn get_results(&self, job_id: JobId) -> Result<Vec<ScrapeResult>> {
        ScrapyClient::get_results(self, job_id).await
    }

    async fn cancel_job(&self, job_id: JobId) -> Result<()> {
        ScrapyClient::cancel_job(self, job_id).await
    }
}
