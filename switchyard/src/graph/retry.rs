//! Retry policy for node execution.
//!
//! Applied by the compiled graph when a node returns an error. Default is no retry.

use std::time::Duration;

use crate::error::AgentError;

#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// Fail on the first error.
    #[default]
    None,
    /// Constant delay between attempts.
    Fixed {
        /// Retries after the first failure.
        max_attempts: usize,
        interval: Duration,
    },
    /// Delay grows by `multiplier` each attempt, capped at `max_interval`.
    Exponential {
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    },
}

impl RetryPolicy {
    pub fn fixed(max_attempts: usize, interval: Duration) -> Self {
        RetryPolicy::Fixed {
            max_attempts,
            interval,
        }
    }

    pub fn exponential(
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    ) -> Self {
        RetryPolicy::Exponential {
            max_attempts,
            initial_interval,
            max_interval,
            multiplier,
        }
    }

    /// Whether a failure on retry number `attempt` (0-based) should be retried.
    ///
    /// Routing and limit errors are structural and never retried.
    pub fn should_retry(&self, attempt: usize, error: &AgentError) -> bool {
        if matches!(
            error,
            AgentError::RecursionLimit { .. } | AgentError::UnknownNode(_) | AgentError::Prompt(_)
        ) {
            return false;
        }
        attempt < self.max_attempts()
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: usize) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { interval, .. } => *interval,
            RetryPolicy::Exponential {
                initial_interval,
                max_interval,
                multiplier,
                ..
            } => {
                let secs = initial_interval.as_secs_f64() * multiplier.powi(attempt as i32);
                Duration::from_secs_f64(secs).min(*max_interval)
            }
        }
    }

    pub fn max_attempts(&self) -> usize {
        match self {
            RetryPolicy::None => 0,
            RetryPolicy::Fixed { max_attempts, .. }
            | RetryPolicy::Exponential { max_attempts, .. } => *max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> AgentError {
        AgentError::ExecutionFailed("connection reset".into())
    }

    #[test]
    fn none_never_retries() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(0, &transient()));
        assert_eq!(policy.delay(0), Duration::ZERO);
    }

    #[test]
    fn fixed_retries_up_to_max() {
        let policy = RetryPolicy::fixed(2, Duration::from_millis(10));
        assert!(policy.should_retry(0, &transient()));
        assert!(policy.should_retry(1, &transient()));
        assert!(!policy.should_retry(2, &transient()));
        assert_eq!(policy.delay(1), Duration::from_millis(10));
    }

    #[test]
    fn exponential_delay_is_capped() {
        let policy =
            RetryPolicy::exponential(5, Duration::from_secs(1), Duration::from_secs(5), 2.0);
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(5));
    }

    #[test]
    fn structural_errors_are_not_retried() {
        let policy = RetryPolicy::fixed(3, Duration::ZERO);
        let err = AgentError::RecursionLimit {
            limit: 5,
            node_id: "agent".into(),
        };
        assert!(!policy.should_retry(0, &err));
        assert!(!policy.should_retry(0, &AgentError::UnknownNode("x".into())));
    }
}
