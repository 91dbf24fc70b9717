//! OpenAI-compatible client construction.
//!
//! Both the embeddings endpoint and the hosted chat model (Groq) speak the
//! OpenAI wire protocol, so they share one client type.

use crate::error::{CasebookError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Read an API key from the environment, rejecting empty values.
pub fn api_key_from_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(CasebookError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(CasebookError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

/// Create a client for an OpenAI-compatible endpoint.
///
/// `api_base` of `None` keeps the library default (api.openai.com).
pub fn create_client(
    api_key: &str,
    api_base: Option<&str>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let err = api_key_from_env("CASEBOOK_TEST_UNSET_KEY_7f3a").unwrap_err();
        assert!(matches!(err, CasebookError::Config(_)));
        assert!(err.to_string().contains("CASEBOOK_TEST_UNSET_KEY_7f3a not set"));
    }

    #[test]
    fn test_create_client_with_custom_base() {
        let client = create_client(
            "test-key",
            Some("https://api.groq.com/openai/v1"),
            Duration::from_secs(5),
        );
        assert!(client.is_ok());
    }
}
