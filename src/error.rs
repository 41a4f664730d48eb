use crate::step::StepName;
use thiserror::Error;

/// Errors raised by the completion client adapter.
///
/// Provider-level failures are surfaced unmodified; the workflow performs
/// no local recovery.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// The HTTP request itself failed (network, TLS, decode).
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("completion API returned status {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the provider
        message: String,
    },
}

/// Errors that can occur while running a workflow invocation.
///
/// Every variant aborts the current step. The step runner's retry policy
/// is the only retry layer; once it is exhausted the invocation is left
/// failed with no partial result.
///
/// # Non-Exhaustive
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// without breaking downstream code; always include a wildcard arm when
/// matching.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WorkflowError {
    /// The provider returned an empty or absent completion text.
    #[error("completion for step '{step}' came back empty")]
    EmptyCompletion {
        /// The step whose completion was empty
        step: StepName,
    },

    /// The model's text was not the JSON object the step asked for.
    ///
    /// The model is not guaranteed to return well-formed JSON; the policy
    /// here is to fail the step and let the retry layer re-run it.
    #[error("step '{step}' returned text that is not the expected JSON: {source}")]
    MalformedCompletion {
        /// The step whose completion failed to parse
        step: StepName,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// A provider-level error, surfaced unmodified.
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// A step attempt exceeded its configured timeout.
    #[error("timeout occurred in step '{step}'")]
    Timeout {
        /// The step that timed out
        step: StepName,
    },

    /// An event arrived that no workflow is registered for.
    #[error("no workflow registered for event '{0}'")]
    UnknownEvent(String),

    /// The event payload did not match the expected shape.
    #[error("event payload did not match the expected shape: {0}")]
    Payload(#[source] serde_json::Error),

    /// A journaled step result could not be encoded or decoded.
    #[error("journal entry for step '{step}' could not be decoded: {source}")]
    Journal {
        /// The step whose record is unusable
        step: StepName,
        /// The underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// The environment configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
