//! Session orchestration
//!
//! [`Session`] owns everything the user edits (mode, source text, prompt,
//! selections) plus the output buffer. Requests run on spawned tasks and
//! report back over a channel; their outcomes are only applied when the
//! owner drains them with [`Session::next_completion`] or
//! [`Session::wait_idle`], so the buffer is never touched concurrently.
//!
//! A new chat request cancels the one still in flight, and a superseded
//! request's outcome is dropped even if its transport finished anyway.
//! Image requests keep no cancellation handle and never supersede each other.

use crate::catalog::{TaskPreset, TASKS};
use crate::compose::{compose_task, insert_source_text, AttributeSelection, Mode};
use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Separates consecutive results in the output buffer.
pub const DIVIDER: &str = "\n***********************\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Chat,
    Image,
}

/// Outcome of one spawned request, as delivered back to the session.
#[derive(Debug)]
pub struct Completion {
    pub id: u64,
    pub kind: RequestKind,
    pub outcome: Result<String, DispatchError>,
}

/// What applying a completion did to the output buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Appended(String),
    Discarded,
}

/// User-editable state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub mode: Mode,
    pub source_text: String,
    pub prompt_text: String,
    pub selection: AttributeSelection,
    pub selected_task: &'static TaskPreset,
    output: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            source_text: String::new(),
            prompt_text: String::new(),
            selection: AttributeSelection::default(),
            selected_task: &TASKS[0],
            output: String::new(),
        }
    }
}

impl SessionState {
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn append_output(&mut self, text: &str) {
        if !self.output.is_empty() {
            self.output.push_str(DIVIDER);
        }
        self.output.push_str(text);
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    /// Select a preset; the prompt text is replaced right away.
    pub fn select_task(&mut self, task: &'static TaskPreset) {
        self.selected_task = task;
        self.prompt_text = compose_task(task);
    }

    /// Rebuild the prompt text for the current mode. Freeform and image
    /// prompts are left as typed.
    pub fn compose_prompt(&mut self) {
        match self.mode {
            Mode::Freeform | Mode::Images => {}
            Mode::Tasks => self.prompt_text = compose_task(self.selected_task),
            Mode::Selections => self.prompt_text = self.selection.compose(),
        }
    }
}

struct InFlight {
    id: u64,
    cancel: CancellationToken,
}

pub struct Session {
    pub state: SessionState,
    dispatcher: Arc<Dispatcher>,
    chat_in_flight: Option<InFlight>,
    latest_chat_id: Option<u64>,
    outstanding: usize,
    next_id: u64,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Session {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_state(dispatcher, SessionState::default())
    }

    pub fn with_state(dispatcher: Dispatcher, state: SessionState) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state,
            dispatcher: Arc::new(dispatcher),
            chat_in_flight: None,
            latest_chat_id: None,
            outstanding: 0,
            next_id: 0,
            tx,
            rx,
        }
    }

    pub fn output(&self) -> &str {
        self.state.output()
    }

    /// True while any spawned request has not been drained yet.
    pub fn is_loading(&self) -> bool {
        self.outstanding > 0
    }

    pub fn clear_results(&mut self) {
        self.state.clear_output();
    }

    /// Compose the prompt for the current mode and start a request.
    ///
    /// Returns the request id, or `None` when an image prompt was empty and
    /// nothing was sent. Must be called from within a tokio runtime.
    pub fn generate(&mut self) -> Option<u64> {
        self.state.compose_prompt();

        match self.state.mode {
            Mode::Images => self.start_image_request(),
            Mode::Freeform | Mode::Tasks | Mode::Selections => Some(self.start_chat_request()),
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn start_chat_request(&mut self) -> u64 {
        if let Some(previous) = self.chat_in_flight.take() {
            info!("Cancelling chat request #{}", previous.id);
            previous.cancel.cancel();
        }

        let id = self.allocate_id();
        let cancel = CancellationToken::new();
        let prompt = insert_source_text(&self.state.prompt_text, &self.state.source_text);

        self.chat_in_flight = Some(InFlight {
            id,
            cancel: cancel.clone(),
        });
        self.latest_chat_id = Some(id);

        info!("Starting chat request #{}", id);
        self.spawn_request(id, RequestKind::Chat, prompt, cancel);
        id
    }

    fn start_image_request(&mut self) -> Option<u64> {
        if self.state.prompt_text.is_empty() {
            debug!("Image prompt is empty; nothing to send");
            return None;
        }

        let id = self.allocate_id();
        let prompt = self.state.prompt_text.clone();

        info!("Starting image request #{}", id);
        // TODO: keep this token and cancel superseded image requests once the
        // image flow is meant to behave like chat.
        self.spawn_request(id, RequestKind::Image, prompt, CancellationToken::new());
        Some(id)
    }

    fn spawn_request(
        &mut self,
        id: u64,
        kind: RequestKind,
        prompt: String,
        cancel: CancellationToken,
    ) {
        self.outstanding += 1;
        let dispatcher = Arc::clone(&self.dispatcher);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let outcome = match kind {
                RequestKind::Chat => dispatcher.send_chat_prompt(&prompt, &cancel).await,
                RequestKind::Image => dispatcher.send_image_prompt(&prompt, &cancel).await,
            };
            // The session may be gone by now; nothing left to report to.
            let _ = tx.send(Completion { id, kind, outcome });
        });
    }

    /// Wait for the next finished request and apply it.
    ///
    /// Returns `None` immediately when nothing is outstanding.
    pub async fn next_completion(&mut self) -> Option<Applied> {
        if self.outstanding == 0 {
            return None;
        }
        let completion = self.rx.recv().await?;
        Some(self.apply(completion))
    }

    /// Drain every outstanding request.
    pub async fn wait_idle(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    fn apply(&mut self, completion: Completion) -> Applied {
        self.outstanding = self.outstanding.saturating_sub(1);

        if completion.kind == RequestKind::Chat {
            if self.latest_chat_id != Some(completion.id) {
                debug!("Discarding superseded chat request #{}", completion.id);
                return Applied::Discarded;
            }
            self.chat_in_flight = None;
        }

        let text = match completion.outcome {
            Ok(text) => text,
            Err(DispatchError::Cancelled) => {
                debug!("Request #{} was cancelled", completion.id);
                return Applied::Discarded;
            }
            Err(
                e @ (DispatchError::EmptyPrompt
                | DispatchError::ServiceUnavailable
                | DispatchError::NoResponse
                | DispatchError::RequestFailed(_)),
            ) => {
                warn!("Request #{} failed: {}", completion.id, e);
                e.to_string()
            }
        };

        self.state.append_output(&text);
        Applied::Appended(text)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(in_flight) = self.chat_in_flight.take() {
            in_flight.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockChatClient, MockImageClient};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn session(chat: MockChatClient, image: MockImageClient) -> Session {
        Session::new(Dispatcher::new(Some(Box::new(chat)), Some(Box::new(image))))
    }

    #[test]
    fn test_append_output_uses_divider() {
        let mut state = SessionState::default();
        state.append_output("first");
        state.append_output("second");
        assert_eq!(state.output(), "first\n***********************\nsecond");
    }

    #[test]
    fn test_clear_output_is_unconditional() {
        let mut state = SessionState::default();
        state.clear_output();
        assert_eq!(state.output(), "");

        state.append_output("something");
        state.clear_output();
        assert_eq!(state.output(), "");
    }

    #[test]
    fn test_select_task_replaces_prompt() {
        let mut state = SessionState::default();
        state.prompt_text = "my own words".to_string();
        state.select_task(&TASKS[1]);
        assert_eq!(state.prompt_text, TASKS[1].description);
    }

    #[test]
    fn test_compose_prompt_leaves_freeform_alone() {
        let mut state = SessionState {
            mode: Mode::Freeform,
            prompt_text: "Make [] funnier".to_string(),
            ..SessionState::default()
        };
        state.compose_prompt();
        assert_eq!(state.prompt_text, "Make [] funnier");
    }

    #[tokio::test]
    async fn test_selections_generate_splices_source_text() {
        let chat = MockChatClient::new().with_response("Better prose".to_string());
        let mut s = session(chat.clone(), MockImageClient::new());
        s.state.source_text = "The cat sat.".to_string();
        s.state.selection.writer = "Jane Austen".to_string();

        s.generate();
        assert!(s.is_loading());
        s.wait_idle().await;

        assert!(!s.is_loading());
        assert_eq!(
            chat.get_prompts(),
            vec!["In the style of Jane Austen.\nRewrite the following selection [The cat sat.]"]
        );
        assert_eq!(s.output(), "Better prose");
    }

    #[tokio::test]
    async fn test_results_accumulate_with_divider() {
        let chat = MockChatClient::new()
            .with_response("one".to_string())
            .with_response("two".to_string());
        let mut s = session(chat, MockImageClient::new());

        s.generate();
        s.wait_idle().await;
        s.generate();
        s.wait_idle().await;

        assert_eq!(s.output(), "one\n***********************\ntwo");
    }

    #[tokio::test]
    async fn test_superseded_chat_request_is_discarded() {
        let chat = MockChatClient::new()
            .with_delay(Duration::from_millis(200))
            .with_response("stale".to_string())
            .with_response("fresh".to_string());
        let mut s = session(chat, MockImageClient::new());
        s.state.mode = Mode::Freeform;
        s.state.prompt_text = "first".to_string();

        let first = s.generate().unwrap();
        // Let the first request reach the (slow) endpoint.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(s.is_loading());

        s.state.prompt_text = "second".to_string();
        let second = s.generate().unwrap();
        assert_ne!(first, second);

        s.wait_idle().await;
        assert_eq!(s.output(), "fresh");
    }

    #[tokio::test]
    async fn test_finished_but_superseded_result_is_discarded() {
        let chat = MockChatClient::new()
            .with_response("stale".to_string())
            .with_response("fresh".to_string());
        let mut s = session(chat, MockImageClient::new());
        s.state.mode = Mode::Freeform;
        s.state.prompt_text = "first".to_string();
        s.generate();

        // Let the first request finish before it is superseded.
        tokio::time::sleep(Duration::from_millis(20)).await;

        s.state.prompt_text = "second".to_string();
        s.generate();
        s.wait_idle().await;

        assert_eq!(s.output(), "fresh");
    }

    #[tokio::test]
    async fn test_empty_freeform_prompt_appends_error() {
        let chat = MockChatClient::new();
        let mut s = session(chat.clone(), MockImageClient::new());
        s.state.mode = Mode::Freeform;
        s.state.prompt_text = "   \n".to_string();

        s.generate();
        s.wait_idle().await;

        assert_eq!(s.output(), "Empty prompt");
        assert_eq!(chat.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_service_message_lands_in_buffer() {
        let mut s = Session::new(Dispatcher::unavailable());
        s.state.append_output("earlier");

        s.generate();
        s.wait_idle().await;

        assert_eq!(
            s.output(),
            "earlier\n***********************\nopenAI not initialized"
        );
    }

    #[tokio::test]
    async fn test_empty_image_prompt_sends_nothing() {
        let image = MockImageClient::new();
        let mut s = session(MockChatClient::new(), image.clone());
        s.state.mode = Mode::Images;

        assert_eq!(s.generate(), None);
        assert!(!s.is_loading());
        s.wait_idle().await;
        assert_eq!(image.get_call_count(), 0);
        assert_eq!(s.output(), "");
    }

    #[tokio::test]
    async fn test_image_requests_do_not_cancel_each_other() {
        let image = MockImageClient::new()
            .with_delay(Duration::from_millis(100))
            .with_url("https://images.example.com/first.png".to_string())
            .with_url("https://images.example.com/second.png".to_string());
        let mut s = session(MockChatClient::new(), image.clone());
        s.state.mode = Mode::Images;
        s.state.prompt_text = "a red fox".to_string();

        s.generate();
        s.generate();
        s.wait_idle().await;

        assert_eq!(image.get_call_count(), 2);
        assert!(s.output().contains("first.png"));
        assert!(s.output().contains("second.png"));
    }

    #[tokio::test]
    async fn test_image_prompt_is_sent_verbatim() {
        let image = MockImageClient::new();
        let mut s = session(MockChatClient::new(), image.clone());
        s.state.mode = Mode::Images;
        s.state.source_text = "ignored".to_string();
        s.state.prompt_text = " a castle [] ".to_string();

        s.generate();
        s.wait_idle().await;

        assert_eq!(image.get_prompts(), vec![" a castle [] "]);
    }

    #[tokio::test]
    async fn test_next_completion_without_requests() {
        let mut s = session(MockChatClient::new(), MockImageClient::new());
        assert_eq!(s.next_completion().await, None);
    }
}
