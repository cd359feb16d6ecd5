//! Bundled API credentials
//!
//! The key file is a small JSON record:
//!
//! ```json
//! { "ChatGptApiKey": "sk-...", "ChatGptOrganization": "org-..." }
//! ```
//!
//! A failed load is logged and otherwise swallowed; the dispatcher then
//! reports the service as unavailable on first use.

use crate::config::Config;
use crate::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ApiKeys {
    #[serde(rename = "ChatGptApiKey")]
    pub api_key: String,
    #[serde(rename = "ChatGptOrganization")]
    pub organization: String,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("api_key", &"<redacted>")
            .field("organization", &self.organization)
            .finish()
    }
}

impl ApiKeys {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        let keys: ApiKeys = serde_json::from_str(&raw)?;
        if keys.api_key.trim().is_empty() {
            return Err(Error::Credentials(format!(
                "ChatGptApiKey is empty in {}",
                path.display()
            )));
        }
        Ok(keys)
    }
}

/// Resolve credentials once at startup.
///
/// `OPENAI_API_KEY` + `OPENAI_ORGANIZATION` win when both are set; otherwise
/// the key file is read. Errors are logged, never returned.
pub fn load(config: &Config) -> Option<ApiKeys> {
    if let (Some(api_key), Some(organization)) =
        (&config.env_api_key, &config.env_organization)
    {
        info!("Using API credentials from environment");
        return Some(ApiKeys {
            api_key: api_key.clone(),
            organization: organization.clone(),
        });
    }

    match ApiKeys::from_file(&config.key_file) {
        Ok(keys) => {
            info!("Loaded API credentials from {}", config.key_file.display());
            Some(keys)
        }
        Err(e) => {
            error!("Failed to load API credentials: {}", e);
            None
        }
    }
}
