//! Runtime configuration read from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_KEY_FILE: &str = "APIKeysSecret.json";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub key_file: PathBuf,
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
    /// `None` leaves timeout policy to the transport defaults.
    pub timeout: Option<Duration>,
    pub env_api_key: Option<String>,
    pub env_organization: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: None,
            env_api_key: None,
            env_organization: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            key_file: non_empty(get_var("WRITEGPT_KEY_FILE"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE)),
            base_url: non_empty(get_var("OPENAI_BASE_URL"))
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            chat_model: non_empty(get_var("OPENAI_CHAT_MODEL"))
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            image_model: non_empty(get_var("OPENAI_IMAGE_MODEL"))
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            timeout: parse_timeout_secs(get_var("OPENAI_TIMEOUT_SECS").as_deref()),
            env_api_key: non_empty(get_var("OPENAI_API_KEY")),
            env_organization: non_empty(get_var("OPENAI_ORGANIZATION")),
        }
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_timeout_secs(raw: Option<&str>) -> Option<Duration> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
