use std::time::Duration;

use scrapy_client::{JobId, ScrapyError};
use thiserror::Error;

use crate::snapshot::JobSnapshot;

pub type Result<T> = std::result::Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    /// Request rejected locally; nothing was sent.
    #[error("Invalid job request: {0}")]
    Validation(String),

    /// Transport failure. Safe for the caller to retry.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Job {0} not found")]
    JobNotFound(JobId),

    #[error("Job {} already started (status {})", .0.id, .0.status)]
    JobAlreadyStarted(Box<scrapy_client::Job>),

    /// The poller stopped watching. The remote job keeps running.
    #[error("Gave up polling job {job_id} after {attempts} attempts ({elapsed:?})")]
    PollTimeout {
        job_id: JobId,
        attempts: u32,
        elapsed: Duration,
        last: Option<Box<JobSnapshot>>,
    },

    #[error("Polling job {0} was cancelled")]
    PollCancelled(JobId),

    #[error("Job {0} is already being polled")]
    AlreadyPolling(JobId),
}

impl JobError {
    /// Only transport failures are worth offering a retry for.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Network(_))
    }

    /// Map a client error for a call made on behalf of a known job, so a 404
    /// becomes `JobNotFound` instead of a generic server error.
    pub(crate) fn for_job(job_id: JobId, err: ScrapyError) -> Self {
        if err.is_not_found() {
            return JobError::JobNotFound(job_id);
        }
        err.into()
    }
}

impl From<ScrapyError> for JobError {
    fn from(err: ScrapyError) -> Self {
        match err {
            ScrapyError::Network(msg) => JobError::Network(msg),
            ScrapyError::Api { status, message } => JobError::Server { status, message },
            // A body we cannot read is the server's fault, not the wire's.
            ScrapyError::Parse(msg) => JobError::Server {
                status: 200,
                message: format!("unreadable response: {msg}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(JobError::Network("reset".into()).is_retryable());
        assert!(!JobError::Server {
            status: 500,
            message: "boom".into()
        }
        .is_retryable());
        assert!(!JobError::Validation("empty".into()).is_retryable());
        assert!(!JobError::PollCancelled(1).is_retryable());
    }

    #[test]
    fn not_found_maps_to_job_not_found() {
        let err = ScrapyError::Api {
            status: 404,
            message: "Not found.".into(),
        };
        assert!(matches!(JobError::for_job(7, err), JobError::JobNotFound(7)));
    }

    #[test]
    fn server_message_is_kept_verbatim() {
        let err: JobError = ScrapyError::Api {
            status: 400,
            message: "Apify token missing".into(),
        }
        .into();
        match err {
            JobError::Server { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Apify token missing");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
