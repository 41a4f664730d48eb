//! Workflow runtime: event routing, invocation lifecycle, resume.

use crate::completion::CompletionClient;
use crate::error::WorkflowError;
use crate::event::{Event, FeatureCreated};
use crate::journal::{InvocationId, InvocationStatus, StepJournal, StepRun};
use crate::marketing::{MarketingPlan, MarketingPlanResult};
use crate::step::StepConfig;
use tracing::{info, warn};

/// Owns the registered workflow, its completion client, and the step
/// journal.
///
/// One `Runtime` serves any number of invocations concurrently; nothing is
/// shared between invocations except the journal, which is partitioned by
/// invocation id.
#[derive(Debug)]
pub struct Runtime<C> {
    plan: MarketingPlan<C>,
    journal: StepJournal,
}

impl<C: CompletionClient> Runtime<C> {
    /// Creates a runtime around an injected completion client.
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            plan: MarketingPlan::new(client, model),
            journal: StepJournal::new(),
        }
    }

    /// Overrides the timeout/retry configuration applied to every step.
    pub fn with_step_config(mut self, step_config: StepConfig) -> Self {
        self.plan = self.plan.with_step_config(step_config);
        self
    }

    /// Read access to the step journal, mostly for inspection.
    pub fn journal(&self) -> &StepJournal {
        &self.journal
    }

    /// Routes an event to the workflow registered for it and runs a fresh
    /// invocation.
    ///
    /// Fails with [`WorkflowError::UnknownEvent`] for any event name other
    /// than [`FeatureCreated::NAME`].
    pub async fn dispatch(&self, event: &Event) -> Result<MarketingPlanResult, WorkflowError> {
        let payload = FeatureCreated::from_event(event)?;
        let id = InvocationId::new();
        info!(invocation = %id, event = %event.name, "invocation started");
        self.run(id, &payload).await
    }

    /// Runs (or re-enters) an invocation by id.
    ///
    /// Re-entering after a failure replays journaled step results, so
    /// already-completed steps are not executed again. On completion the
    /// invocation's journal partition is disposed of; only failed
    /// invocations stay resident, so a long-lived runtime does not
    /// accumulate state for finished work.
    pub async fn run(
        &self,
        id: InvocationId,
        payload: &FeatureCreated,
    ) -> Result<MarketingPlanResult, WorkflowError> {
        self.journal.set_status(id, InvocationStatus::Running);
        let run = StepRun::new(id, &self.journal);

        match self.plan.handle(payload, &run).await {
            Ok(result) => {
                self.journal.remove(id);
                info!(invocation = %id, "invocation complete");
                Ok(result)
            }
            Err(error) => {
                self.journal.set_status(id, InvocationStatus::Failed);
                warn!(invocation = %id, error = %error, "invocation failed");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{Completion, CompletionRequest};
    use crate::error::CompletionError;
    use async_trait::async_trait;

    struct RejectingClient;

    #[async_trait]
    impl CompletionClient for RejectingClient {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<Completion, CompletionError> {
            Err(CompletionError::Api {
                status: 401,
                message: "bad credentials".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_dispatch_rejects_unknown_event() {
        let runtime = Runtime::new(RejectingClient, "text-davinci-003");
        let event = Event::new("app/other.event", serde_json::json!({}));
        assert!(matches!(
            runtime.dispatch(&event).await,
            Err(WorkflowError::UnknownEvent(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_error_marks_invocation_failed() {
        let runtime = Runtime::new(RejectingClient, "text-davinci-003");
        let id = InvocationId::new();
        let payload = FeatureCreated {
            input: "Dark mode toggle in settings".to_string(),
        };

        let result = runtime.run(id, &payload).await;
        assert!(matches!(result, Err(WorkflowError::Completion(_))));
        assert_eq!(
            runtime.journal().status(id),
            Some(InvocationStatus::Failed)
        );
        assert_eq!(runtime.journal().step_count(id), 0);
    }
}
