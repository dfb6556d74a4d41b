//! Lifecycle of remote scrape jobs.
//!
//! A job is created ([`submit`]), started ([`start`]), watched until it
//! settles ([`poller`]) and, once completed, its results are collected
//! ([`results`]). [`lifecycle::JobLifecycle`] strings those together for
//! callers that just want "run this scrape and tell me how it goes".

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod poller;
pub mod quick;
pub mod request;
pub mod results;
pub mod snapshot;
pub mod start;
pub mod stats;
pub mod submit;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use api::JobApi;
pub use config::ScrapeConfig;
pub use error::{JobError, Result};
pub use lifecycle::{JobLifecycle, JobOutcome};
pub use poller::{PollConfig, PollHandle, PollRegistry, PollSession, Poller};
pub use quick::QuickScrape;
pub use request::JobRequest;
pub use results::ResultFetcher;
pub use snapshot::{FnSink, JobSnapshot, NoopSink, SnapshotSink};
pub use start::JobStarter;
pub use stats::JobStats;
pub use submit::JobSubmitter;

pub use scrapy_client::{ContentType, Job, JobId, JobStatus, Platform, ScrapeResult};
