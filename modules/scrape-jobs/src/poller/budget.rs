use std::time::Duration;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(10 * 60);

/// Poll cadence and the hard ceiling on how long to keep watching a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between the end of one poll and the start of the next.
    pub interval: Duration,
    /// Wall-clock ceiling. Always enforced.
    pub max_duration: Duration,
    /// Optional cap on poll requests, on top of `max_duration`.
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_duration: DEFAULT_MAX_DURATION,
            max_attempts: None,
        }
    }
}

impl PollConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Whether the budget is spent after `attempts` polls at `elapsed`.
    ///
    /// The next poll would start at `elapsed + interval`; if that lands on or
    /// past the ceiling we stop now, so a poller never outlives
    /// `max_duration + interval`.
    pub fn exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        if let Some(max) = self.max_attempts {
            if attempts >= max {
                return true;
            }
        }
        elapsed.saturating_add(self.interval) >= self.max_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn defaults() {
        let config = PollConfig::default();
        assert_eq!(config.interval, secs(3));
        assert_eq!(config.max_duration, secs(600));
        assert_eq!(config.max_attempts, None);
    }

    #[test]
    fn five_second_budget_at_one_second_allows_five_polls() {
        let config = PollConfig::default()
            .with_interval(secs(1))
            .with_max_duration(secs(5));

        // Polls happen at t = 0, 1, 2, 3, 4.
        for attempt in 1..=4 {
            assert!(!config.exhausted(attempt, secs(attempt as u64 - 1)));
        }
        assert!(config.exhausted(5, secs(4)));
    }

    #[test]
    fn attempt_cap_applies_first() {
        let config = PollConfig::default().with_max_attempts(2);
        assert!(!config.exhausted(1, Duration::ZERO));
        assert!(config.exhausted(2, Duration::ZERO));
    }

    #[test]
    fn slow_responses_count_against_the_ceiling() {
        let config = PollConfig::default()
            .with_interval(secs(1))
            .with_max_duration(secs(5));
        // One poll that took 4.5s leaves no room for another.
        assert!(config.exhausted(1, Duration::from_millis(4500)));
    }
}
