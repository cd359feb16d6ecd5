//! Request dispatch
//!
//! Wraps one outbound call per operation and folds every failure into a
//! [`DispatchError`]. A missing client means startup could not initialise it
//! (no credentials, unusable HTTP client) and is reported as
//! [`DispatchError::ServiceUnavailable`].

use crate::ai::{
    ChatService, ImageGenerationService, ImageOutput, OpenAiChatClient, OpenAiHttpClient,
    OpenAiImageClient,
};
use crate::config::Config;
use crate::credentials::ApiKeys;
use crate::error::DispatchError;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// What the image endpoint's inline (base64) payload is reported as.
pub const INLINE_IMAGE_MARKER: &str = "json format";

pub struct Dispatcher {
    chat: Option<Box<dyn ChatService>>,
    image: Option<Box<dyn ImageGenerationService>>,
}

impl Dispatcher {
    pub fn new(
        chat: Option<Box<dyn ChatService>>,
        image: Option<Box<dyn ImageGenerationService>>,
    ) -> Self {
        Self { chat, image }
    }

    /// A dispatcher whose every call fails with `ServiceUnavailable`.
    pub fn unavailable() -> Self {
        Self::new(None, None)
    }

    /// Build OpenAI-backed clients from the startup credentials.
    ///
    /// Never fails: problems are logged and leave the dispatcher unavailable.
    pub fn from_credentials(keys: Option<&ApiKeys>, config: &Config) -> Self {
        let Some(keys) = keys else {
            error!("No API credentials available; requests will fail until redeployed");
            return Self::unavailable();
        };

        match OpenAiHttpClient::new(keys, &config.base_url, config.timeout) {
            Ok(http) => {
                info!(
                    "Chat model: {}, image model: {}",
                    config.chat_model, config.image_model
                );
                Self::new(
                    Some(Box::new(OpenAiChatClient::new(
                        http.clone(),
                        config.chat_model.clone(),
                    ))),
                    Some(Box::new(OpenAiImageClient::new(
                        http,
                        config.image_model.clone(),
                    ))),
                )
            }
            Err(e) => {
                error!("Failed to initialise HTTP client: {}", e);
                Self::unavailable()
            }
        }
    }

    pub async fn send_chat_prompt(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, DispatchError> {
        if prompt.trim().is_empty() {
            return Err(DispatchError::EmptyPrompt);
        }
        let chat = self
            .chat
            .as_ref()
            .ok_or(DispatchError::ServiceUnavailable)?;

        debug!("Dispatching chat prompt ({} chars)", prompt.len());
        Ok(cancellable(cancel, chat.complete(prompt)).await??)
    }

    /// Callers are expected to reject empty prompts themselves.
    pub async fn send_image_prompt(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, DispatchError> {
        let image = self
            .image
            .as_ref()
            .ok_or(DispatchError::ServiceUnavailable)?;

        debug!("Dispatching image prompt ({} chars)", prompt.len());
        match cancellable(cancel, image.generate_image(prompt)).await?? {
            ImageOutput::Url(url) => Ok(url),
            ImageOutput::Inline(_) => Ok(INLINE_IMAGE_MARKER.to_string()),
        }
    }
}

/// Race `call` against `cancel`. Cancellation wins ties.
async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = T>,
) -> Result<T, DispatchError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DispatchError::Cancelled),
        output = call => Ok(output),
    }
}
