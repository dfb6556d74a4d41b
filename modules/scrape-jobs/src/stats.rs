use std::collections::BTreeMap;
use std::fmt;

use scrapy_client::{Job, JobStatus};

/// Aggregate counters over a job listing, for dashboard summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobStats {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub successful_scrapes: u64,
    pub failed_scrapes: u64,
    /// Whole percent of scrapes that succeeded; 0 when nothing was scraped.
    pub success_rate: u32,
}

impl JobStats {
    pub fn from_jobs(jobs: &[Job]) -> Self {
        let mut stats = JobStats {
            total: jobs.len(),
            ..Default::default()
        };

        for job in jobs {
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
            }
            stats.successful_scrapes += job.successful_scrapes as u64;
            stats.failed_scrapes += job.failed_scrapes as u64;
        }

        let attempted = stats.successful_scrapes + stats.failed_scrapes;
        if attempted > 0 {
            stats.success_rate =
                (stats.successful_scrapes as f64 / attempted as f64 * 100.0).round() as u32;
        }
        stats
    }
}

impl fmt::Display for JobStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} jobs ({} completed, {} running, {} pending, {} failed, {} cancelled), {}% scrape success",
            self.total,
            self.completed,
            self.running,
            self.pending,
            self.failed,
            self.cancelled,
            self.success_rate
        )
    }
}

/// Share of jobs on one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformShare {
    pub label: &'static str,
    pub count: usize,
    pub percent: u32,
}

/// Jobs grouped by platform, most common first. Jobs without a known
/// platform are grouped under "Unknown".
pub fn platform_distribution(jobs: &[Job]) -> Vec<PlatformShare> {
    if jobs.is_empty() {
        return Vec::new();
    }

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for job in jobs {
        let label = job.platform().map(|p| p.label()).unwrap_or("Unknown");
        *counts.entry(label).or_default() += 1;
    }

    let total = jobs.len() as f64;
    let mut shares: Vec<PlatformShare> = counts
        .into_iter()
        .map(|(label, count)| PlatformShare {
            label,
            count,
            percent: (count as f64 / total * 100.0).round() as u32,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then(a.label.cmp(b.label)));
    shares
}

/// The newest completed job that actually produced data.
pub fn most_recent_with_data(jobs: &[Job]) -> Option<&Job> {
    jobs.iter()
        .filter(|j| j.status == JobStatus::Completed && j.successful_scrapes > 0)
        .max_by_key(|j| j.updated_at)
}
