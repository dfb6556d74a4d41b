use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned job identifier.
pub type JobId = i64;

// --- Enumerations ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Facebook,
    LinkedIn,
    TikTok,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Instagram,
        Platform::Facebook,
        Platform::LinkedIn,
        Platform::TikTok,
    ];

    /// Upper bound on `num_of_posts` accepted for a job on this platform.
    /// TikTok is held lower because of its stricter anti-automation checks.
    pub fn max_posts(self) -> u32 {
        match self {
            Platform::TikTok => 20,
            _ => 50,
        }
    }

    /// Wire value, as used in request bodies and query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::LinkedIn => "linkedin",
            Platform::TikTok => "tiktok",
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::LinkedIn => "LinkedIn",
            Platform::TikTok => "TikTok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown platform: {s}"))
    }
}

/// What to collect per target. The backend's job config also accepts
/// `reels` and `comments` beyond the `posts`/`profile` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Posts,
    Profile,
    Reels,
    Comments,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Posts => "posts",
            ContentType::Profile => "profile",
            ContentType::Reels => "reels",
            ContentType::Comments => "comments",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job state as reported by the server.
///
/// `Pending` and `Running` are the only non-terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Requests ---

/// Body of `POST /scrapy/api/jobs/create_job/`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateJobBody {
    pub name: String,
    pub project_id: i64,
    pub platform: Platform,
    pub content_type: ContentType,
    pub target_urls: Vec<String>,
    pub source_names: Vec<String>,
    pub num_of_posts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

// --- Responses ---

/// Scraper configuration nested in a job (`config_details`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfigDetails {
    pub platform: Option<Platform>,
    #[serde(default)]
    pub content_type: Option<ContentType>,
}

/// A scraping job as serialized by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project: Option<i64>,
    pub status: JobStatus,
    #[serde(default)]
    pub config_details: Option<JobConfigDetails>,
    #[serde(default)]
    pub target_urls: Vec<String>,
    #[serde(default)]
    pub source_names: Vec<String>,
    #[serde(default)]
    pub total_urls: u32,
    #[serde(default)]
    pub processed_urls: u32,
    #[serde(default)]
    pub successful_scrapes: u32,
    #[serde(default)]
    pub failed_scrapes: u32,
    #[serde(default, rename = "progress_percentage")]
    pub reported_progress: Option<f64>,
    #[serde(default)]
    pub job_metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub error_log: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Progress in percent (0–100). Uses the server figure when present,
    /// otherwise derives it from the URL counters.
    pub fn progress_percentage(&self) -> f64 {
        let raw = match self.reported_progress {
            Some(p) => p,
            None if self.total_urls > 0 => {
                self.processed_urls as f64 / self.total_urls as f64 * 100.0
            }
            None => 0.0,
        };
        raw.clamp(0.0, 100.0)
    }

    pub fn platform(&self) -> Option<Platform> {
        self.config_details.as_ref().and_then(|c| c.platform)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One scraped target, returned by `GET /scrapy/api/jobs/{id}/results/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub source_name: Option<String>,
    /// Platform- and content-type-specific payload. Opaque here.
    #[serde(default)]
    pub scraped_data: serde_json::Value,
    #[serde(default)]
    pub processed_data: Option<serde_json::Value>,
    #[serde(default)]
    pub scrape_timestamp: Option<DateTime<Utc>>,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Listing response. The backend paginates (`{count, results}`) but
/// unpaginated deployments return a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JobListResponse {
    Page { count: u64, results: Vec<Job> },
    Bare(Vec<Job>),
}

impl JobListResponse {
    pub fn into_jobs(self) -> Vec<Job> {
        match self {
            JobListResponse::Page { results, .. } => results,
            JobListResponse::Bare(jobs) => jobs,
        }
    }
}

/// Acknowledgement body returned by start/cancel (`{"message": "..."}`).
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of a start request: some deployments echo the job, others acknowledge.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StartResponse {
    Job(Box<Job>),
    Ack(Ack),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_json() -> serde_json::Value {
        serde_json::json!({
            "id": 42,
            "name": "Quick Instagram Scrape - 1/2/2025",
            "project": 9,
            "config": 3,
            "config_details": {"id": 3, "platform": "instagram", "content_type": "posts", "name": "Default"},
            "target_urls": ["https://instagram.com/x"],
            "source_names": ["Quick Scrape"],
            "num_of_posts": 10,
            "start_date": null,
            "end_date": null,
            "status": "running",
            "status_display": "Running",
            "total_urls": 4,
            "processed_urls": 1,
            "successful_scrapes": 1,
            "failed_scrapes": 0,
            "progress_percentage": 25.0,
            "job_metadata": null,
            "error_log": null,
            "created_at": "2025-01-02T10:00:00.123456Z",
            "updated_at": "2025-01-02T10:00:05Z",
            "started_at": "2025-01-02T10:00:01Z",
            "completed_at": null
        })
    }

    #[test]
    fn deserializes_backend_job() {
        let job: Job = serde_json::from_value(job_json()).unwrap();
        assert_eq!(job.id, 42);
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.platform(), Some(Platform::Instagram));
        assert_eq!(job.progress_percentage(), 25.0);
        assert!(job.started_at.is_some());
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn derives_progress_when_server_omits_it() {
        let mut value = job_json();
        value.as_object_mut().unwrap().remove("progress_percentage");
        let job: Job = serde_json::from_value(value).unwrap();
        assert_eq!(job.progress_percentage(), 25.0);
    }

    #[test]
    fn progress_is_zero_without_urls() {
        let job: Job =
            serde_json::from_value(serde_json::json!({"id": 1, "status": "pending"})).unwrap();
        assert_eq!(job.progress_percentage(), 0.0);
    }

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result: Result<Job, _> =
            serde_json::from_value(serde_json::json!({"id": 1, "status": "paused"}));
        assert!(result.is_err());
    }

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("TikTok".parse::<Platform>().unwrap(), Platform::TikTok);
        assert_eq!(" linkedin ".parse::<Platform>().unwrap(), Platform::LinkedIn);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn tiktok_has_lower_post_bound() {
        assert_eq!(Platform::TikTok.max_posts(), 20);
        assert_eq!(Platform::Instagram.max_posts(), 50);
    }

    #[test]
    fn create_body_omits_missing_dates() {
        let body = CreateJobBody {
            name: "n".into(),
            project_id: 9,
            platform: Platform::LinkedIn,
            content_type: ContentType::Profile,
            target_urls: vec!["https://linkedin.com/in/x".into()],
            source_names: vec![],
            num_of_posts: 10,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            end_date: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["platform"], "linkedin");
        assert_eq!(value["content_type"], "profile");
        assert_eq!(value["start_date"], "2025-01-01");
        assert!(value.get("end_date").is_none());
    }

    #[test]
    fn content_types_match_backend_choices() {
        for (raw, expected) in [
            ("posts", ContentType::Posts),
            ("profile", ContentType::Profile),
            ("reels", ContentType::Reels),
            ("comments", ContentType::Comments),
        ] {
            let parsed: ContentType = serde_json::from_value(serde_json::json!(raw)).unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(expected.as_str(), raw);
        }
        let unknown: Result<ContentType, _> = serde_json::from_value(serde_json::json!("stories"));
        assert!(unknown.is_err());
    }

    #[test]
    fn start_response_accepts_ack_or_job() {
        let ack: StartResponse =
            serde_json::from_str(r#"{"message": "Job started successfully"}"#).unwrap();
        assert!(matches!(ack, StartResponse::Ack(_)));

        let job: StartResponse = serde_json::from_value(job_json()).unwrap();
        assert!(matches!(job, StartResponse::Job(_)));
    }

    #[test]
    fn list_accepts_page_and_bare_array() {
        let page: JobListResponse = serde_json::from_value(serde_json::json!({
            "count": 1,
            "next": null,
            "results": [job_json()]
        }))
        .unwrap();
        assert_eq!(page.into_jobs().len(), 1);

        let bare: JobListResponse =
            serde_json::from_value(serde_json::json!([job_json(), job_json()])).unwrap();
        assert_eq!(bare.into_jobs().len(), 2);
    }
}
