//! AI service integration
//!
//! Trait seams over the hosted chat-completion and image-generation APIs,
//! with an OpenAI implementation and in-memory mocks.

pub mod mock;
pub mod openai;

pub use mock::{MockChatClient, MockImageClient};
pub use openai::{OpenAiChatClient, OpenAiHttpClient, OpenAiImageClient};

use crate::Result;
use async_trait::async_trait;

/// What an image endpoint handed back for the first generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutput {
    Url(String),
    /// Base64-encoded image bytes.
    Inline(String),
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send `prompt` as a single user message and return the first reply.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<ImageOutput>;
}
