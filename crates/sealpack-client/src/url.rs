//! Redirect URLs for the enable flow.

use crate::config::AbilityConfig;

pub const ENABLE_PATH: &str = "/v1/api/integration/enable";

/// Builds the URL a user is sent back to after enabling an integration.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    enable_url: String,
}

impl UrlBuilder {
    pub fn new(config: &AbilityConfig) -> Self {
        Self {
            enable_url: config.endpoint(ENABLE_PATH),
        }
    }

    /// `state` is passed through as given. `error` is percent-encoded and
    /// omitted when absent or empty.
    pub fn build_enable_url(&self, state: &str, error: Option<&str>) -> String {
        match error.filter(|e| !e.is_empty()) {
            Some(error) => format!(
                "{}?state={state}&error={}",
                self.enable_url,
                urlencoding::encode(error)
            ),
            None => format!("{}?state={state}", self.enable_url),
        }
    }
}
