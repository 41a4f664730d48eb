//! Commonly used types and traits

pub use crate::completion::{Choice, Completion, CompletionClient, CompletionRequest};
pub use crate::config::Config;
pub use crate::error::{CompletionError, WorkflowError};
pub use crate::event::{Event, FeatureCreated};
pub use crate::journal::{InvocationId, InvocationStatus, StepJournal, StepRun};
pub use crate::marketing::{BlogPost, BrandingCopy, FeatureBranding, MarketingPlanResult};
pub use crate::step::{RetryPolicy, StepConfig, StepName};
pub use crate::workflow::Runtime;
