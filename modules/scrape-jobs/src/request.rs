use chrono::NaiveDate;
use scrapy_client::{ContentType, CreateJobBody, Platform};
use typed_builder::TypedBuilder;

use crate::error::{JobError, Result};

/// What to scrape. Built once by the caller and only ever read by the core.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct JobRequest {
    #[builder(setter(into))]
    pub name: String,
    pub project_id: i64,
    pub platform: Platform,
    #[builder(default)]
    pub content_type: ContentType,
    pub target_urls: Vec<String>,
    /// Empty, or one label per target URL.
    #[builder(default)]
    pub source_names: Vec<String>,
    #[builder(default = 10)]
    pub num_of_posts: u32,
    #[builder(default)]
    pub start_date: Option<NaiveDate>,
    #[builder(default)]
    pub end_date: Option<NaiveDate>,
}

impl JobRequest {
    /// Check the request and produce the create-job body.
    ///
    /// Runs entirely locally; the first violated rule is reported.
    pub fn validate(&self) -> Result<CreateJobBody> {
        if self.project_id <= 0 {
            return Err(invalid(format!(
                "project_id must be positive, got {}",
                self.project_id
            )));
        }

        if self.target_urls.is_empty() {
            return Err(invalid("at least one target URL is required"));
        }

        let target_urls: Vec<String> = self
            .target_urls
            .iter()
            .map(|u| u.trim().to_string())
            .collect();
        if let Some(pos) = target_urls.iter().position(|u| u.is_empty()) {
            return Err(invalid(format!("target URL #{} is blank", pos + 1)));
        }

        if !self.source_names.is_empty() && self.source_names.len() != target_urls.len() {
            return Err(invalid(format!(
                "{} source names given for {} target URLs",
                self.source_names.len(),
                target_urls.len()
            )));
        }

        let max = self.platform.max_posts();
        if self.num_of_posts == 0 || self.num_of_posts > max {
            return Err(invalid(format!(
                "num_of_posts must be between 1 and {max} for {}, got {}",
                self.platform.label(),
                self.num_of_posts
            )));
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(invalid(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid("job name is required"));
        }

        Ok(CreateJobBody {
            name: name.to_string(),
            project_id: self.project_id,
            platform: self.platform,
            content_type: self.content_type,
            target_urls,
            source_names: self.source_names.clone(),
            num_of_posts: self.num_of_posts,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

fn invalid(msg: impl Into<String>) -> JobError {
    JobError::Validation(msg.into())
}
