//! # Oshirase (お知らせ)
//!
//! An event-triggered workflow that turns a feature description into a
//! launch announcement.
//!
//! The name "Oshirase" (お知らせ) means "announcement" in Japanese. When an
//! `app/feature.created` event arrives, the workflow calls a
//! text-completion API twice in sequence: first to brand the feature
//! (name, headline, description), then to expand that branding into an
//! announcement blog post, and returns the combined result.
//!
//! ## Features
//!
//! - **Journaled steps**: each step's result is recorded before the next
//!   step starts, so re-running a failed invocation never re-executes (or
//!   re-bills) a completed step
//! - **Injected client**: the completion API sits behind the
//!   [`CompletionClient`] trait; production uses [`HttpCompletionClient`],
//!   tests script responses
//! - **Retry Support**: per-step retry policies (fixed delay, exponential
//!   backoff) and timeouts, default off
//! - **Error Handling**: structured errors with `thiserror`; empty and
//!   malformed completions fail their step explicitly
//!
//! ## Quick Start
//!
//! ```rust
//! use oshirase::prelude::*;
//! use async_trait::async_trait;
//!
//! struct CannedClient;
//!
//! #[async_trait]
//! impl CompletionClient for CannedClient {
//!     async fn complete(
//!         &self,
//!         _request: CompletionRequest,
//!     ) -> Result<Completion, CompletionError> {
//!         Ok(Completion {
//!             id: "cmpl-1".into(),
//!             choices: vec![Choice {
//!                 text: Some(
//!                     r#"{"feature_name":"NightShift","headline":"See in the dark","description":"..."}"#
//!                         .into(),
//!                 ),
//!             }],
//!         })
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), WorkflowError> {
//! let runtime = Runtime::new(CannedClient, "text-davinci-003");
//! let event = Event::feature_created("Dark mode toggle in settings");
//!
//! let plan = runtime.dispatch(&event).await?;
//! assert_eq!(plan.feature_branding.result.feature_name, "NightShift");
//! # Ok(())
//! # }
//! ```
//!
//! ## Production Setup
//!
//! The provider credential is read from the environment once, at process
//! start, and the client is passed in explicitly:
//!
//! ```rust,no_run
//! use oshirase::{Config, HttpCompletionClient, Runtime};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), oshirase::WorkflowError> {
//! let config = Config::from_env()?;
//! let client = HttpCompletionClient::new(&config);
//! let runtime = Runtime::new(client, config.model.clone());
//! # Ok(())
//! # }
//! ```
//!
//! ## Resuming an Invocation
//!
//! [`Runtime::run`] re-enters an invocation by id. Journaled step results
//! are replayed, so a branding call that already succeeded is reused when
//! the blog-post step is retried:
//!
//! ```rust,ignore
//! let id = InvocationId::new();
//! if runtime.run(id, &payload).await.is_err() {
//!     // step 1's result is journaled; only step 2 runs again
//!     runtime.run(id, &payload).await?;
//! }
//! ```

mod completion;
mod config;
mod error;
mod event;
mod journal;
mod marketing;
mod step;
mod workflow;

pub mod prelude;

pub use completion::{Choice, Completion, CompletionClient, CompletionRequest, HttpCompletionClient};
pub use config::Config;
pub use error::{CompletionError, WorkflowError};
pub use event::{Event, FeatureCreated};
pub use journal::{InvocationId, InvocationStatus, StepJournal, StepRun};
pub use marketing::{
    BlogPost, BrandingCopy, FeatureBranding, MarketingPlan, MarketingPlanResult, BLOG_STEP,
    BRANDING_STEP,
};
pub use step::{RetryPolicy, StepConfig, StepName};
pub use workflow::Runtime;
