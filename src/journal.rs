//! Durable step log.
//!
//! Each invocation owns a journal partition keyed by step name. A step's
//! serialized result is recorded before the next step starts, so re-running
//! an invocation (after a later step failed) replays recorded results
//! instead of executing their steps again. This memoized-step contract is
//! what keeps a retried second step from re-billing the first one.
//!
//! Partitions exist only as long as they are useful: a completed
//! invocation's partition is disposed of once its terminal value has been
//! returned, while failed partitions stay resident so the invocation can
//! be resumed. Nothing outlives its invocation.

use crate::error::WorkflowError;
use crate::step::{StepConfig, StepName};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Identifier of one workflow invocation.
///
/// # Examples
///
/// ```
/// use oshirase::InvocationId;
///
/// let id = InvocationId::new();
/// assert_ne!(id, InvocationId::new());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvocationId(uuid::Uuid);

impl InvocationId {
    /// Mints a fresh invocation id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an invocation the journal is holding state for.
///
/// There is no `Complete` status: a completed invocation's partition is
/// removed, so [`StepJournal::status`] returning `None` means the
/// invocation was never seen or has already finished and been disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationStatus {
    /// No step has started yet.
    #[default]
    Pending,
    /// The handler is between its first step and its terminal state.
    Running,
    /// A step exhausted its retries; the partition is kept for resume.
    Failed,
}

#[derive(Debug, Default)]
struct InvocationRecord {
    status: InvocationStatus,
    steps: HashMap<StepName, Value>,
}

/// In-memory step log, partitioned by invocation id.
///
/// The journal is the only state shared across invocations; each partition
/// is touched by exactly one logical thread of control at a time, the
/// mutex just makes concurrent invocations safe on a multithreaded
/// runtime.
#[derive(Debug, Default)]
pub struct StepJournal {
    inner: Mutex<HashMap<InvocationId, InvocationRecord>>,
}

impl StepJournal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded result for a step, if any.
    pub fn recorded(&self, id: InvocationId, step: &StepName) -> Option<Value> {
        self.lock()
            .get(&id)
            .and_then(|record| record.steps.get(step).cloned())
    }

    /// Returns the status of an invocation the journal is holding.
    ///
    /// `None` means the invocation was never seen, or completed and was
    /// disposed of.
    pub fn status(&self, id: InvocationId) -> Option<InvocationStatus> {
        self.lock().get(&id).map(|record| record.status)
    }

    /// Removes an invocation's partition: its status and every recorded
    /// step result.
    ///
    /// The runtime does this on completion; embedders can also call it to
    /// abandon a failed invocation they will never resume.
    pub fn remove(&self, id: InvocationId) {
        self.lock().remove(&id);
    }

    /// Number of recorded step results for an invocation.
    pub fn step_count(&self, id: InvocationId) -> usize {
        self.lock().get(&id).map_or(0, |record| record.steps.len())
    }

    pub(crate) fn record(&self, id: InvocationId, step: StepName, value: Value) {
        self.lock().entry(id).or_default().steps.insert(step, value);
    }

    pub(crate) fn set_status(&self, id: InvocationId, status: InvocationStatus) {
        self.lock().entry(id).or_default().status = status;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<InvocationId, InvocationRecord>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle for running journaled steps within one invocation.
///
/// Created by the runtime for each (re-)entry of an invocation.
#[derive(Debug, Clone, Copy)]
pub struct StepRun<'a> {
    id: InvocationId,
    journal: &'a StepJournal,
}

impl<'a> StepRun<'a> {
    /// Binds an invocation id to its journal.
    pub fn new(id: InvocationId, journal: &'a StepJournal) -> Self {
        Self { id, journal }
    }

    /// Returns the invocation id this run belongs to.
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Runs a step, replaying its journaled result when one exists.
    ///
    /// A fresh step executes under the configured timeout and retry
    /// policy; the serialized result is recorded before this returns, so
    /// a failure in any later step leaves the checkpoint in place.
    pub async fn step<T, F, Fut>(
        &self,
        name: impl Into<StepName>,
        config: StepConfig,
        run: F,
    ) -> Result<T, WorkflowError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, WorkflowError>>,
    {
        let name = name.into();

        if let Some(value) = self.journal.recorded(self.id, &name) {
            debug!(invocation = %self.id, step = %name, "replaying journaled step result");
            return serde_json::from_value(value).map_err(|source| WorkflowError::Journal {
                step: name,
                source,
            });
        }

        let mut attempt: u32 = 0;
        let output = loop {
            let attempt_result = match config.timeout {
                Some(limit) => match timeout(limit, run()).await {
                    Ok(result) => result,
                    Err(_) => Err(WorkflowError::Timeout { step: name.clone() }),
                },
                None => run().await,
            };

            match attempt_result {
                Ok(output) => break output,
                Err(error) if attempt < config.retry_policy.max_retries() => {
                    warn!(
                        invocation = %self.id,
                        step = %name,
                        attempt,
                        error = %error,
                        "step failed, retrying"
                    );
                    if let Some(delay) = config.retry_policy.delay_for_attempt(attempt) {
                        sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(error) => {
                    warn!(invocation = %self.id, step = %name, error = %error, "step failed");
                    return Err(error);
                }
            }
        };

        let value = serde_json::to_value(&output).map_err(|source| WorkflowError::Journal {
            step: name.clone(),
            source,
        })?;
        self.journal.record(self.id, name.clone(), value);
        info!(invocation = %self.id, step = %name, "step completed");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::RetryPolicy;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn no_retry() -> StepConfig {
        StepConfig::default()
    }

    #[tokio::test]
    async fn test_step_records_result() {
        let journal = StepJournal::new();
        let id = InvocationId::new();
        let run = StepRun::new(id, &journal);

        let result: u32 = run
            .step("double", no_retry(), || async { Ok(21 * 2) })
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert_eq!(journal.step_count(id), 1);
        assert_eq!(
            journal.recorded(id, &StepName::new("double")),
            Some(serde_json::json!(42))
        );
    }

    #[tokio::test]
    async fn test_recorded_step_is_not_re_executed() {
        let journal = StepJournal::new();
        let id = InvocationId::new();
        let run = StepRun::new(id, &journal);
        let calls = AtomicU32::new(0);
        let calls = &calls;

        for _ in 0..3 {
            let value: String = run
                .step("once", no_retry(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("executed".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "executed");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_step_leaves_no_record() {
        let journal = StepJournal::new();
        let id = InvocationId::new();
        let run = StepRun::new(id, &journal);

        let result: Result<u32, _> = run
            .step("boom", no_retry(), || async {
                Err(WorkflowError::EmptyCompletion {
                    step: StepName::new("boom"),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(journal.step_count(id), 0);
    }

    #[tokio::test]
    async fn test_retry_policy_re_invokes_step() {
        let journal = StepJournal::new();
        let id = InvocationId::new();
        let run = StepRun::new(id, &journal);
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let config = StepConfig {
            timeout: None,
            retry_policy: RetryPolicy::fixed(2, Duration::from_millis(1)),
        };

        let value: u32 = run
            .step("flaky", config, || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(WorkflowError::EmptyCompletion {
                        step: StepName::new("flaky"),
                    })
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(journal.step_count(id), 1);
    }

    #[tokio::test]
    async fn test_step_timeout() {
        let journal = StepJournal::new();
        let id = InvocationId::new();
        let run = StepRun::new(id, &journal);

        let config = StepConfig {
            timeout: Some(Duration::from_millis(5)),
            retry_policy: RetryPolicy::None,
        };

        let result: Result<u32, _> = run
            .step("slow", config, || async {
                sleep(Duration::from_secs(5)).await;
                Ok(1)
            })
            .await;

        assert!(matches!(result, Err(WorkflowError::Timeout { step }) if step.as_str() == "slow"));
    }

    #[tokio::test]
    async fn test_journal_partitions_by_invocation() {
        let journal = StepJournal::new();
        let first = InvocationId::new();
        let second = InvocationId::new();

        StepRun::new(first, &journal)
            .step::<u32, _, _>("shared-name", no_retry(), || async { Ok(1) })
            .await
            .unwrap();

        assert_eq!(journal.step_count(first), 1);
        assert_eq!(journal.step_count(second), 0);
        assert_eq!(journal.recorded(second, &StepName::new("shared-name")), None);
    }

    #[test]
    fn test_status_defaults_and_updates() {
        let journal = StepJournal::new();
        let id = InvocationId::new();
        assert_eq!(journal.status(id), None);

        journal.set_status(id, InvocationStatus::Running);
        assert_eq!(journal.status(id), Some(InvocationStatus::Running));

        journal.set_status(id, InvocationStatus::Failed);
        assert_eq!(journal.status(id), Some(InvocationStatus::Failed));
    }

    #[tokio::test]
    async fn test_remove_disposes_partition() {
        let journal = StepJournal::new();
        let id = InvocationId::new();
        let run = StepRun::new(id, &journal);

        run.step::<u32, _, _>("work", no_retry(), || async { Ok(5) })
            .await
            .unwrap();
        journal.set_status(id, InvocationStatus::Running);
        assert_eq!(journal.step_count(id), 1);

        journal.remove(id);
        assert_eq!(journal.step_count(id), 0);
        assert_eq!(journal.status(id), None);
        assert_eq!(journal.recorded(id, &StepName::new("work")), None);
    }
}
