//! REST client for the scrapy-integration jobs API.
//!
//! Thin wrapper over the backend's job endpoints: create, start, status,
//! results, cancel and listing. Holds no lifecycle policy; polling and
//! retries belong to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use scrapy_client::ScrapyClient;
//!
//! let client = ScrapyClient::new("http://localhost:8000/api", None);
//! let job = client.get_job(42).await?;
//! println!("{} is {}", job.id, job.status);
//! ```

pub mod error;
pub mod types;

pub use error::{Result, ScrapyError};
pub use types::{
    Ack, ContentType, CreateJobBody, Job, JobConfigDetails, JobId, JobListResponse, JobStatus,
    Platform, ScrapeResult, StartResponse,
};

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

const JOBS_PATH: &str = "scrapy/api/jobs";

pub struct ScrapyClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ScrapyClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self::with_timeout(base_url, token, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, token: Option<&str>, timeout: Duration) -> Self {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    timeout_secs = timeout.as_secs(),
                    "Failed to build HTTP client, falling back to defaults without a timeout"
                );
                reqwest::Client::new()
            }
        };

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, JOBS_PATH, path)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = self.authed(req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScrapyError::Api {
                status: status.as_u16(),
                message: error::error_message(&body),
            });
        }

        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = self.send(req).await?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Create a job. The backend answers with the new job in `pending`.
    pub async fn create_job(&self, body: &CreateJobBody) -> Result<Job> {
        let url = self.url("create_job/");
        tracing::debug!(platform = %body.platform, urls = body.target_urls.len(), "Creating scrape job");
        self.send_json(self.client.post(&url).json(body)).await
    }

    /// Ask the backend to start a created job.
    pub async fn start_job(&self, job_id: JobId) -> Result<StartResponse> {
        let url = self.url(&format!("{job_id}/start_job/"));
        tracing::debug!(job_id, "Starting scrape job");
        self.send_json(self.client.post(&url)).await
    }

    /// Fetch the current state of a job.
    pub async fn get_job(&self, job_id: JobId) -> Result<Job> {
        let url = self.url(&format!("{job_id}/"));
        self.send_json(self.client.get(&url)).await
    }

    /// Fetch every result row of a job in one request.
    pub async fn get_results(&self, job_id: JobId) -> Result<Vec<ScrapeResult>> {
        let url = self.url(&format!("{job_id}/results/"));
        self.send_json(self.client.get(&url)).await
    }

    /// Request cancellation. Success means the backend acknowledged it.
    pub async fn cancel_job(&self, job_id: JobId) -> Result<()> {
        let url = self.url(&format!("{job_id}/cancel_job/"));
        tracing::debug!(job_id, "Cancelling scrape job");
        self.send(self.client.post(&url)).await?;
        Ok(())
    }

    /// List jobs for a project, optionally restricted to one platform.
    pub async fn list_jobs(&self, project_id: i64, platform: Option<Platform>) -> Result<Vec<Job>> {
        let url = format!("{}/{}/", self.base_url, JOBS_PATH);
        let mut query = vec![("project_id", project_id.to_string())];
        if let Some(platform) = platform {
            query.push(("platform", platform.as_str().to_string()));
        }

        let listing: JobListResponse = self.send_json(self.client.get(&url).query(&query)).await?;
        Ok(listing.into_jobs())
    }
}
