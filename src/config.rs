//! Environment configuration.
//!
//! One secret credential is consumed at process start; everything else has
//! a default. The loaded [`Config`] is an explicit value handed to the
//! pieces that need it rather than a process-global.

use crate::error::WorkflowError;
use std::env;

/// Environment variable holding the provider credential.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable overriding the API base URL.
pub const API_BASE_VAR: &str = "OPENAI_API_BASE";
/// Environment variable overriding the completion model.
pub const MODEL_VAR: &str = "COMPLETIONS_MODEL";

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-davinci-003";

/// Settings for talking to the completion provider.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider credential, sent as a bearer token
    pub api_key: String,
    /// Base URL of the completion API
    pub api_base: String,
    /// Model used for both workflow steps
    pub model: String,
}

impl Config {
    /// Loads configuration from the environment, reading `.env` if present.
    ///
    /// Fails with [`WorkflowError::Configuration`] when the API key is not
    /// set.
    pub fn from_env() -> Result<Self, WorkflowError> {
        dotenvy::dotenv().ok();

        let api_key = env::var(API_KEY_VAR)
            .map_err(|_| WorkflowError::Configuration(format!("{} not set", API_KEY_VAR)))?;
        let api_base = env::var(API_BASE_VAR).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let model = env::var(MODEL_VAR).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            api_base,
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the env mutations cannot race each other.
    #[test]
    fn test_from_env() {
        env::remove_var(API_KEY_VAR);
        assert!(matches!(
            Config::from_env(),
            Err(WorkflowError::Configuration(_))
        ));

        env::set_var(API_KEY_VAR, "sk-test");
        env::remove_var(API_BASE_VAR);
        env::remove_var(MODEL_VAR);
        let config = Config::from_env().unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.model, DEFAULT_MODEL);
        env::remove_var(API_KEY_VAR);
    }
}
