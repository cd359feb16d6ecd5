use super::{ChatService, ImageGenerationService, ImageOutput};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum MockReply<T> {
    Ok(T),
    Failure(String),
    Empty,
}

impl<T: Clone> MockReply<T> {
    fn to_result(&self) -> Result<T> {
        match self {
            MockReply::Ok(value) => Ok(value.clone()),
            MockReply::Failure(message) => Err(Error::AiProvider(message.clone())),
            MockReply::Empty => Err(Error::NoResponse("Mock returned nothing".to_string())),
        }
    }
}

/// Shared bookkeeping for both mocks: queued replies (cycled), per-call
/// delays, and the prompts received.
#[derive(Debug, Clone)]
struct MockState<T> {
    replies: Arc<Mutex<Vec<MockReply<T>>>>,
    delays: Arc<Mutex<Vec<Duration>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl<T: Clone> MockState<T> {
    fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            delays: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn push(&self, reply: MockReply<T>) {
        self.replies.lock().unwrap().push(reply);
    }

    /// Record the call and pick its reply and delay. Locks are released
    /// before the caller awaits anything.
    fn record(&self, prompt: &str) -> (Option<Result<T>>, Duration) {
        let call_index = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };

        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(call_index)
            .copied()
            .unwrap_or_default();

        let replies = self.replies.lock().unwrap();
        let reply = if replies.is_empty() {
            None
        } else {
            Some(replies[call_index % replies.len()].to_result())
        };

        (reply, delay)
    }

    fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone)]
pub struct MockChatClient {
    state: MockState<String>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            state: MockState::new(),
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.state.push(MockReply::Ok(response));
        self
    }

    pub fn with_failure(self, message: String) -> Self {
        self.state.push(MockReply::Failure(message));
        self
    }

    pub fn with_no_response(self) -> Self {
        self.state.push(MockReply::Empty);
        self
    }

    /// Delays are consumed in call order: the first one applies to the
    /// first call, and so on.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state.delays.lock().unwrap().push(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.state.call_count()
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.state.prompts()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let (reply, delay) = self.state.record(prompt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        // Default mock response
        reply.unwrap_or_else(|| Ok(format!("Rewritten: {}", prompt)))
    }
}

#[derive(Debug, Clone)]
pub struct MockImageClient {
    state: MockState<ImageOutput>,
}

impl MockImageClient {
    pub fn new() -> Self {
        Self {
            state: MockState::new(),
        }
    }

    pub fn with_url(self, url: String) -> Self {
        self.state.push(MockReply::Ok(ImageOutput::Url(url)));
        self
    }

    pub fn with_inline(self, b64_json: String) -> Self {
        self.state.push(MockReply::Ok(ImageOutput::Inline(b64_json)));
        self
    }

    pub fn with_failure(self, message: String) -> Self {
        self.state.push(MockReply::Failure(message));
        self
    }

    pub fn with_no_response(self) -> Self {
        self.state.push(MockReply::Empty);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.state.delays.lock().unwrap().push(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.state.call_count()
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.state.prompts()
    }
}

impl Default for MockImageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<ImageOutput> {
        let (reply, delay) = self.state.record(prompt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply.unwrap_or_else(|| {
            Ok(ImageOutput::Url(
                "https://images.example.com/generated.png".to_string(),
            ))
        })
    }
}
