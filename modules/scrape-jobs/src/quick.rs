use chrono::{DateTime, Local, NaiveDate};
use scrapy_client::{ContentType, Platform};

use crate::request::JobRequest;

pub const QUICK_SCRAPE_SOURCE: &str = "Quick Scrape";

/// The single-URL "quick scrape" offered on each platform page.
#[derive(Debug, Clone)]
pub struct QuickScrape {
    pub platform: Platform,
    pub url: String,
    pub num_of_posts: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl QuickScrape {
    pub fn new(platform: Platform, url: impl Into<String>) -> Self {
        Self {
            platform,
            url: url.into(),
            num_of_posts: None,
            start_date: None,
            end_date: None,
        }
    }

    pub fn posts(mut self, n: u32) -> Self {
        self.num_of_posts = Some(n);
        self
    }

    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// TikTok defaults lower to stay under its rate limits.
    pub fn default_posts(platform: Platform) -> u32 {
        match platform {
            Platform::TikTok => 5,
            _ => 10,
        }
    }

    pub fn into_request(self, project_id: i64) -> JobRequest {
        self.into_request_at(project_id, Local::now())
    }

    /// Build the request with an explicit timestamp for the job name.
    pub fn into_request_at(self, project_id: i64, now: DateTime<Local>) -> JobRequest {
        let num_of_posts = self
            .num_of_posts
            .unwrap_or_else(|| Self::default_posts(self.platform));

        JobRequest::builder()
            .name(format!(
                "Quick {} Scrape - {}",
                self.platform.label(),
                now.format("%Y-%m-%d %H:%M:%S")
            ))
            .project_id(project_id)
            .platform(self.platform)
            .content_type(ContentType::Posts)
            .target_urls(vec![self.url])
            .source_names(vec![QUICK_SCRAPE_SOURCE.to_string()])
            .num_of_posts(num_of_posts)
            .start_date(self.start_date)
            .end_date(self.end_date)
            .build()
    }
}
