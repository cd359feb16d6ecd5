use super::types::{ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse};
use crate::credentials::ApiKeys;
use crate::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Authenticated HTTP access to an OpenAI-compatible API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct OpenAiHttpClient {
    pub(crate) client: Client,
    api_key: String,
    organization: String,
    base_url: String,
}

impl OpenAiHttpClient {
    pub fn new(keys: &ApiKeys, base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self::new_with_client(keys, base_url, client))
    }

    pub fn new_with_client(keys: &ApiKeys, base_url: &str, client: Client) -> Self {
        Self {
            client,
            api_key: keys.api_key.clone(),
            organization: keys.organization.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        if !self.organization.is_empty() {
            builder = builder.header("OpenAI-Organization", &self.organization);
        }

        let response = builder.json(request).send().await.map_err(|e| {
            tracing::error!("Failed to send request to OpenAI: {}", e);
            e
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("OpenAI API error (status {}): {}", status, error_text);
            return Err(Error::AiProvider(api_error_message(status, &error_text)));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse OpenAI response: {}\nBody: {}", e, body);
            Error::AiProvider(format!("Failed to parse OpenAI response: {}", e))
        })
    }

    pub async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.post("/v1/chat/completions", &request).await
    }
}

/// Prefer the service's own explanation (e.g. quota exhausted) over the raw body.
fn api_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.trim().is_empty() => parsed.error.message,
        _ => format!("OpenAI API error (status {}): {}", status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message_uses_error_envelope() {
        let body = r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota"}}"#;
        assert_eq!(
            api_error_message(StatusCode::TOO_MANY_REQUESTS, body),
            "You exceeded your current quota"
        );
    }

    #[test]
    fn test_api_error_message_falls_back_to_status_and_body() {
        assert_eq!(
            api_error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "OpenAI API error (status 502 Bad Gateway): upstream down"
        );
    }
}
