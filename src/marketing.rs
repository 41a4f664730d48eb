//! The marketing-plan workflow: two sequential completion-API steps.
//!
//! Step 1 brands the feature (name, headline, description) from the
//! trigger event's free-text input. Step 2 expands that branding into an
//! announcement blog post. Both steps run through the step journal, so a
//! failure while drafting the blog post never re-runs (or re-bills) the
//! branding call.

use crate::completion::{CompletionClient, CompletionRequest};
use crate::error::WorkflowError;
use crate::event::FeatureCreated;
use crate::journal::StepRun;
use crate::step::{StepConfig, StepName};
use serde::{Deserialize, Serialize};

/// Journal name of the branding step.
pub const BRANDING_STEP: &str = "generate-feature-branding";
/// Journal name of the blog-post step.
pub const BLOG_STEP: &str = "draft-announcement-blog-post";

const BRANDING_MAX_TOKENS: u32 = 256;
const BLOG_MAX_TOKENS: u32 = 1024;

/// The three-key JSON object the branding prompt asks the model for.
///
/// `deny_unknown_fields` plus three required fields means the completion
/// must contain exactly these keys or the step fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrandingCopy {
    /// Compelling name for the feature
    pub feature_name: String,
    /// Social-media headline
    pub headline: String,
    /// Two-sentence pitch
    pub description: String,
}

/// Output of the branding step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureBranding {
    /// Provider-assigned completion identifier
    pub completion_id: String,
    /// Parsed branding copy
    pub result: BrandingCopy,
}

/// Output of the blog-post step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    /// Provider-assigned completion identifier
    pub completion_id: String,
    /// Raw blog post text, never empty
    pub result: String,
}

/// Terminal value of one workflow invocation. Not persisted beyond the
/// invocation's journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingPlanResult {
    /// Branding produced by step 1
    pub feature_branding: FeatureBranding,
    /// Blog post produced by step 2
    pub blog_post: BlogPost,
}

fn branding_prompt(input: &str) -> String {
    format!(
        "You are a product marketer and copywriter. \
         Your job is to create captivating marketing copy and headlines for announcing a new product feature. \
         You must brand the feature with a compelling name, create a captivating headline for social media, \
         and create a 2-sentence description for why it is so useful. \
         You must respond in a JSON object with the following keys: \"feature_name\", \"headline\", and \"description\".\n\n\
         The feature's technical description is: \"{input}\""
    )
}

// Branding fields are embedded verbatim, without escaping.
fn blog_prompt(copy: &BrandingCopy) -> String {
    format!(
        "You are a content marketer. \
         Your job is to create compelling blog posts that announce new software features to developers. \
         You must write a blog post that explains why a software developer would use the feature \
         and include two different use cases for the new feature.\n\n\
         The feature's name is: \"{}\"\n\
         The blog post's headline is: \"{}\"\n\
         The feature's description is: \"{}\"",
        copy.feature_name, copy.headline, copy.description
    )
}

/// The "create marketing plan" workflow, triggered by
/// [`FeatureCreated`](crate::FeatureCreated) events.
#[derive(Debug)]
pub struct MarketingPlan<C> {
    client: C,
    model: String,
    step_config: StepConfig,
}

impl<C: CompletionClient> MarketingPlan<C> {
    /// Creates the workflow with an injected completion client and model.
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            step_config: StepConfig::default(),
        }
    }

    /// Overrides the timeout/retry configuration applied to both steps.
    pub fn with_step_config(mut self, step_config: StepConfig) -> Self {
        self.step_config = step_config;
        self
    }

    /// Runs the handler body for one invocation.
    ///
    /// Steps execute strictly in sequence; step 2 only starts after step
    /// 1's parsed output has been journaled.
    pub async fn handle(
        &self,
        event: &FeatureCreated,
        run: &StepRun<'_>,
    ) -> Result<MarketingPlanResult, WorkflowError> {
        let feature_branding: FeatureBranding = run
            .step(BRANDING_STEP, self.step_config.clone(), || {
                self.generate_branding(&event.input)
            })
            .await?;

        let copy = feature_branding.result.clone();
        let blog_post: BlogPost = run
            .step(BLOG_STEP, self.step_config.clone(), || {
                self.draft_blog_post(&copy)
            })
            .await?;

        Ok(MarketingPlanResult {
            feature_branding,
            blog_post,
        })
    }

    async fn generate_branding(&self, input: &str) -> Result<FeatureBranding, WorkflowError> {
        let completion = self
            .client
            .complete(CompletionRequest {
                model: self.model.clone(),
                prompt: branding_prompt(input),
                max_tokens: BRANDING_MAX_TOKENS,
            })
            .await?;

        let text = completion
            .first_text()
            .ok_or_else(|| WorkflowError::EmptyCompletion {
                step: StepName::new(BRANDING_STEP),
            })?;

        let result: BrandingCopy =
            serde_json::from_str(text.trim()).map_err(|source| WorkflowError::MalformedCompletion {
                step: StepName::new(BRANDING_STEP),
                source,
            })?;

        Ok(FeatureBranding {
            completion_id: completion.id.clone(),
            result,
        })
    }

    async fn draft_blog_post(&self, copy: &BrandingCopy) -> Result<BlogPost, WorkflowError> {
        let completion = self
            .client
            .complete(CompletionRequest {
                model: self.model.clone(),
                prompt: blog_prompt(copy),
                max_tokens: BLOG_MAX_TOKENS,
            })
            .await?;

        // Same empty-output rule as step 1.
        let text = completion
            .first_text()
            .ok_or_else(|| WorkflowError::EmptyCompletion {
                step: StepName::new(BLOG_STEP),
            })?;

        Ok(BlogPost {
            completion_id: completion.id.clone(),
            result: text.to_string(),
        })
    }
}
