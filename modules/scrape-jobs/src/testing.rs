// Test double for the JobApi seam.
//
// MockJobApi replays scripted replies and records every call, so tests can
// assert both what the lifecycle returned and what it sent. Builder style:
// `.on_create()`, `.on_start()`, `.then_status()`, `.slow_polls()`,
// `.on_results()`, `.on_cancel()`.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use scrapy_client::{
    Ack, CreateJobBody, Job, JobId, JobStatus, Result, ScrapeResult, ScrapyError, StartResponse,
};

use crate::api::JobApi;

/// A canned reply. Cloneable, unlike `ScrapyError`.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Network(String),
    Api(u16, String),
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<T> {
        match self {
            Reply::Ok(v) => Ok(v),
            Reply::Network(msg) => Err(ScrapyError::Network(msg)),
            Reply::Api(status, message) => Err(ScrapyError::Api { status, message }),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Call {
    Create(CreateJobBody),
    Start(JobId),
    GetJob(JobId),
    Results(JobId),
    Cancel(JobId),
}

pub struct MockJobApi {
    create: Mutex<Option<Reply<Job>>>,
    start: Mutex<VecDeque<Reply<StartResponse>>>,
    statuses: Mutex<VecDeque<Reply<Job>>>,
    results: Mutex<Reply<Vec<ScrapeResult>>>,
    cancel: Mutex<Reply<()>>,
    poll_delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<Call>>,
}

impl Default for MockJobApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockJobApi {
    /// Creates job 42 in `pending`, acknowledges starts and cancels, and
    /// returns no results. Polls fail with 404 until a status is scripted.
    pub fn new() -> Self {
        Self {
            create: Mutex::new(None),
            start: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            results: Mutex::new(Reply::Ok(Vec::new())),
            cancel: Mutex::new(Reply::Ok(())),
            poll_delay: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_create(self, reply: Reply<Job>) -> Self {
        *self.create.lock().unwrap() = Some(reply);
        self
    }

    /// Queue a start reply. Once the queue is empty starts are acknowledged.
    pub fn on_start(self, reply: Reply<StartResponse>) -> Self {
        self.start.lock().unwrap().push_back(reply);
        self
    }

    /// Queue a `get_job` reply. The last one queued repeats forever.
    pub fn then_status(self, job: Job) -> Self {
        self.then_poll(Reply::Ok(job))
    }

    pub fn then_poll(self, reply: Reply<Job>) -> Self {
        self.statuses.lock().unwrap().push_back(reply);
        self
    }

    /// Make every `get_job` take `delay` before answering.
    pub fn slow_polls(self, delay: Duration) -> Self {
        *self.poll_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn on_results(self, results: Vec<ScrapeResult>) -> Self {
        *self.results.lock().unwrap() = Reply::Ok(results);
        self
    }

    pub fn on_cancel(self, reply: Reply<()>) -> Self {
        *self.cancel.lock().unwrap() = reply;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Create(_)))
    }

    pub fn start_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Start(_)))
    }

    pub fn poll_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::GetJob(_)))
    }

    pub fn result_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Results(_)))
    }

    pub fn cancel_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Cancel(_)))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl JobApi for MockJobApi {
    async fn create_job(&self, body: &CreateJobBody) -> Result<Job> {
        self.record(Call::Create(body.clone()));
        self.create
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Reply::Ok(job(42, JobStatus::Pending, 0, body.target_urls.len() as u32)))
            .into_result()
    }

    async fn start_job(&self, job_id: JobId) -> Result<StartResponse> {
        self.record(Call::Start(job_id));
        self.start
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Reply::Ok(StartResponse::Ack(Ack {
                    message: Some("Job started successfully".into()),
                }))
            })
            .into_result()
    }

    async fn get_job(&self, job_id: JobId) -> Result<Job> {
        self.record(Call::GetJob(job_id));
        let delay = *self.poll_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut statuses = self.statuses.lock().unwrap();
        let reply = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        reply
            .unwrap_or_else(|| Reply::Api(404, "Not found.".into()))
            .into_result()
    }

    async fn get_results(&self, job_id: JobId) -> Result<Vec<ScrapeResult>> {
        self.record(Call::Results(job_id));
        self.results.lock().unwrap().clone().into_result()
    }

    async fn cancel_job(&self, job_id: JobId) -> Result<()> {
        self.record(Call::Cancel(job_id));
        self.cancel.lock().unwrap().clone().into_result()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn job(id: JobId, status: JobStatus, processed_urls: u32, total_urls: u32) -> Job {
    Job {
        id,
        name: format!("fixture job {id}"),
        project: Some(9),
        status,
        config_details: None,
        target_urls: Vec::new(),
        source_names: Vec::new(),
        total_urls,
        processed_urls,
        successful_scrapes: processed_urls,
        failed_scrapes: 0,
        reported_progress: None,
        job_metadata: None,
        error_log: match status {
            JobStatus::Failed => Some("scraper exited with code 1".into()),
            _ => None,
        },
        created_at: None,
        updated_at: None,
        started_at: None,
        completed_at: None,
    }
}

pub fn ok_result(url: &str) -> ScrapeResult {
    ScrapeResult {
        id: Some(1),
        source_url: url.to_string(),
        source_name: Some("Quick Scrape".into()),
        scraped_data: serde_json::json!({"posts": []}),
        processed_data: None,
        scrape_timestamp: None,
        success: true,
        error_message: None,
    }
}
