use std::fmt;
use std::time::Duration;

/// Type-safe step name wrapper.
///
/// Step results are journaled under this name, so it doubles as the
/// replay key: renaming a step invalidates its recorded results.
///
/// # Examples
///
/// ```
/// use oshirase::StepName;
///
/// let name = StepName::new("generate-feature-branding");
/// assert_eq!(name.as_str(), "generate-feature-branding");
///
/// let name: StepName = "draft-announcement-blog-post".into();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepName(String);

impl StepName {
    /// Creates a new StepName
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the step name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StepName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for StepName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for StepName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Retry policy for step execution.
///
/// Defines how a step is re-run when it fails. A step that already has a
/// journaled result is never re-run, whatever the policy says.
///
/// # Examples
///
/// ```
/// use oshirase::RetryPolicy;
/// use std::time::Duration;
///
/// // No retry (default)
/// let policy = RetryPolicy::None;
///
/// // Fixed delay: retry 3 times with 1 second delay
/// let policy = RetryPolicy::fixed(3, Duration::from_secs(1));
///
/// // Exponential backoff: retry 5 times starting at 100ms, doubling each time
/// let policy = RetryPolicy::exponential(5, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// No retry - fail immediately on error.
    #[default]
    None,
    /// Fixed delay between retries.
    Fixed {
        /// Maximum number of retry attempts
        max_retries: u32,
        /// Delay between each retry
        delay: Duration,
    },
    /// Doubling backoff, capped at `max_delay`.
    ExponentialBackoff {
        /// Maximum number of retry attempts
        max_retries: u32,
        /// Initial delay before first retry
        initial_delay: Duration,
        /// Maximum delay cap
        max_delay: Duration,
    },
}

impl RetryPolicy {
    /// Creates a fixed retry policy.
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        RetryPolicy::Fixed { max_retries, delay }
    }

    /// Creates a doubling backoff policy with a 60 second delay cap.
    ///
    /// # Examples
    ///
    /// ```
    /// use oshirase::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential(5, Duration::from_millis(100));
    ///
    /// // Delays: 100ms, 200ms, 400ms, 800ms, 1600ms
    /// assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_millis(100)));
    /// assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(400)));
    /// ```
    pub fn exponential(max_retries: u32, initial_delay: Duration) -> Self {
        RetryPolicy::ExponentialBackoff {
            max_retries,
            initial_delay,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Returns the maximum number of retries for this policy.
    pub fn max_retries(&self) -> u32 {
        match self {
            RetryPolicy::None => 0,
            RetryPolicy::Fixed { max_retries, .. } => *max_retries,
            RetryPolicy::ExponentialBackoff { max_retries, .. } => *max_retries,
        }
    }

    /// Calculates the delay for the given retry attempt (0-indexed).
    ///
    /// Returns `None` for `RetryPolicy::None`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            RetryPolicy::None => None,
            RetryPolicy::Fixed { delay, .. } => Some(*delay),
            RetryPolicy::ExponentialBackoff {
                initial_delay,
                max_delay,
                ..
            } => {
                let delay = (initial_delay.as_millis() as u64)
                    .saturating_mul(2u64.saturating_pow(attempt));
                Some(Duration::from_millis(
                    delay.min(max_delay.as_millis() as u64),
                ))
            }
        }
    }
}

/// Configuration for a journaled step.
///
/// # Examples
///
/// ```
/// use oshirase::{RetryPolicy, StepConfig};
/// use std::time::Duration;
///
/// let config = StepConfig {
///     timeout: Some(Duration::from_secs(60)),
///     retry_policy: RetryPolicy::fixed(3, Duration::from_secs(1)),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct StepConfig {
    /// Maximum time allowed for one attempt. `None` means no timeout.
    /// Default: 30 seconds.
    pub timeout: Option<Duration>,
    /// Retry policy when the step fails. Default: no retry.
    pub retry_policy: RetryPolicy,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            retry_policy: RetryPolicy::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_name_conversions() {
        let name = StepName::new("generate-feature-branding");
        assert_eq!(name.as_str(), "generate-feature-branding");
        assert_eq!(name.to_string(), "generate-feature-branding");

        let from_str: StepName = "draft-announcement-blog-post".into();
        assert_eq!(from_str.as_str(), "draft-announcement-blog-post");
    }

    #[test]
    fn test_retry_policy_none() {
        let policy = RetryPolicy::None;
        assert_eq!(policy.max_retries(), 0);
        assert_eq!(policy.delay_for_attempt(0), None);
    }

    #[test]
    fn test_retry_policy_fixed() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(1));
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_retry_policy_exponential() {
        let policy = RetryPolicy::exponential(5, Duration::from_millis(100));
        assert_eq!(policy.max_retries(), 5);
        assert_eq!(
            policy.delay_for_attempt(0),
            Some(Duration::from_millis(100))
        );
        assert_eq!(
            policy.delay_for_attempt(1),
            Some(Duration::from_millis(200))
        );
        assert_eq!(
            policy.delay_for_attempt(2),
            Some(Duration::from_millis(400))
        );
        // capped at max_delay (60s)
        assert_eq!(policy.delay_for_attempt(30), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_step_config_default() {
        let config = StepConfig::default();
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.retry_policy, RetryPolicy::None);
    }
}
