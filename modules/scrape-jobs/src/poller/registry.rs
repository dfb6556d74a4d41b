use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use scrapy_client::JobId;

use crate::error::{JobError, Result};

/// The set of jobs with a live poll loop. At most one loop per job id.
///
/// Claiming is a single check-and-insert under the lock, never split
/// across an await.
#[derive(Clone, Default)]
pub struct PollRegistry {
    active: Arc<Mutex<HashSet<JobId>>>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the poll slot for `job_id`. The slot frees itself on drop.
    pub fn claim(&self, job_id: JobId) -> Result<PollSlot> {
        if !self.lock().insert(job_id) {
            return Err(JobError::AlreadyPolling(job_id));
        }
        Ok(PollSlot {
            active: self.active.clone(),
            job_id,
        })
    }

    pub fn is_polling(&self, job_id: JobId) -> bool {
        self.lock().contains(&job_id)
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<JobId>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Ownership of one job's poll slot.
pub struct PollSlot {
    active: Arc<Mutex<HashSet<JobId>>>,
    job_id: JobId,
}

impl PollSlot {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }
}

impl Drop for PollSlot {
    fn drop(&mut self) {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.job_id);
    }
}
