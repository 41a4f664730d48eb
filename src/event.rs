//! Trigger event contract.

use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event envelope as delivered to the runtime.
///
/// Events carry a name used for routing and an untyped JSON payload that
/// the matched workflow decodes into its own payload type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Routing name, e.g. `app/feature.created`
    pub name: String,
    /// Free-form payload
    pub data: Value,
}

impl Event {
    /// Creates an event with an arbitrary name and payload.
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Convenience constructor for the feature-created trigger.
    ///
    /// # Examples
    ///
    /// ```
    /// use oshirase::{Event, FeatureCreated};
    ///
    /// let event = Event::feature_created("Dark mode toggle in settings");
    /// assert_eq!(event.name, FeatureCreated::NAME);
    /// ```
    pub fn feature_created(input: impl Into<String>) -> Self {
        Self {
            name: FeatureCreated::NAME.to_string(),
            data: serde_json::json!({ "input": input.into() }),
        }
    }
}

/// Payload of the `app/feature.created` trigger event.
///
/// Received once per workflow invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCreated {
    /// Free-text technical description of the new feature. Arbitrary
    /// length, untrusted.
    pub input: String,
}

impl FeatureCreated {
    /// Event name this payload is registered under.
    pub const NAME: &'static str = "app/feature.created";

    /// Extracts the typed payload from an event envelope.
    ///
    /// Fails with [`WorkflowError::UnknownEvent`] when the event name does
    /// not match, and [`WorkflowError::Payload`] when the data does not
    /// decode.
    pub fn from_event(event: &Event) -> Result<Self, WorkflowError> {
        if event.name != Self::NAME {
            return Err(WorkflowError::UnknownEvent(event.name.clone()));
        }
        serde_json::from_value(event.data.clone()).map_err(WorkflowError::Payload)
    }
}
