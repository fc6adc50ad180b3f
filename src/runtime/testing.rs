//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::{DialogManager, Incoming};
use crate::render::Prompt;
use crate::services::{
    ConversionResult, CurrencyConverter, ImageProvider, PollPublisher, ServiceError, ServiceSet,
    WeatherProvider, WeatherReport,
};
use crate::state_machine::{ChatId, Event, MessageId, PollDraft, ServiceCall};
use crate::telegram::TransportError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Recording Transport
// ============================================================================

/// Something the runtime pushed out to a chat
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Prompt(ChatId, Prompt),
    Image(ChatId, String),
    Deleted(ChatId, MessageId),
}

/// Transport that records everything instead of talking to a platform
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Items sent to one chat, in order
    pub fn sent_to(&self, chat_id: ChatId) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| match s {
                Sent::Prompt(id, _) | Sent::Image(id, _) | Sent::Deleted(id, _) => *id == chat_id,
            })
            .collect()
    }

    /// Prompt texts sent to one chat, in order
    pub fn texts_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sent_to(chat_id)
            .into_iter()
            .filter_map(|s| match s {
                Sent::Prompt(_, prompt) => Some(prompt.text),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `count` items were sent to a chat
    pub async fn wait_for(&self, chat_id: ChatId, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.sent_to(chat_id).len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_prompt(&self, chat_id: ChatId, prompt: &Prompt) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Prompt(chat_id, prompt.clone()));
        Ok(())
    }

    async fn send_image(&self, chat_id: ChatId, url: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Image(chat_id, url.to_string()));
        Ok(())
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Deleted(chat_id, message_id));
        Ok(())
    }
}

// ============================================================================
// Mock Services
// ============================================================================

/// All four adapters backed by queued results
#[derive(Default)]
pub struct MockServices {
    weather: Mutex<VecDeque<Result<WeatherReport, ServiceError>>>,
    conversions: Mutex<VecDeque<Result<ConversionResult, ServiceError>>>,
    images: Mutex<VecDeque<Result<String, ServiceError>>>,
    polls: Mutex<VecDeque<Result<(), ServiceError>>>,
    /// Record of all calls made
    pub calls: Mutex<Vec<ServiceCall>>,
    /// Delay before every reply (for timeout testing)
    delay: Option<Duration>,
}

impl MockServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queue_weather(&self, result: Result<WeatherReport, ServiceError>) {
        self.weather.lock().unwrap().push_back(result);
    }

    pub fn queue_conversion(&self, result: Result<ConversionResult, ServiceError>) {
        self.conversions.lock().unwrap().push_back(result);
    }

    pub fn queue_image(&self, result: Result<String, ServiceError>) {
        self.images.lock().unwrap().push_back(result);
    }

    pub fn queue_poll(&self, result: Result<(), ServiceError>) {
        self.polls.lock().unwrap().push_back(result);
    }

    pub fn recorded_calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn into_set(self: Arc<Self>) -> ServiceSet {
        ServiceSet::new(self.clone(), self.clone(), self.clone(), self)
    }

    async fn reply<R>(
        &self,
        call: ServiceCall,
        queue: &Mutex<VecDeque<Result<R, ServiceError>>>,
    ) -> Result<R, ServiceError> {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::unavailable("No mock response queued")))
    }
}

#[async_trait]
impl WeatherProvider for MockServices {
    async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherReport, ServiceError> {
        let call = ServiceCall::FetchWeather {
            latitude,
            longitude,
        };
        self.reply(call, &self.weather).await
    }
}

#[async_trait]
impl CurrencyConverter for MockServices {
    async fn convert(
        &self,
        base: &str,
        target: &str,
        amount: f64,
    ) -> Result<ConversionResult, ServiceError> {
        let call = ServiceCall::ConvertCurrency {
            base: base.to_string(),
            target: target.to_string(),
            amount,
        };
        self.reply(call, &self.conversions).await
    }
}

#[async_trait]
impl ImageProvider for MockServices {
    async fn random_image_url(&self) -> Result<String, ServiceError> {
        self.reply(ServiceCall::RandomPetImage, &self.images).await
    }
}

#[async_trait]
impl PollPublisher for MockServices {
    async fn publish_poll(&self, poll: &PollDraft) -> Result<(), ServiceError> {
        self.reply(ServiceCall::PublishPoll(poll.clone()), &self.polls)
            .await
    }
}

// ============================================================================
// Test Runtime Builder
// ============================================================================

pub type TestManager = DialogManager<Arc<InMemorySessionStore>, Arc<RecordingTransport>>;

/// Helper for building test managers with minimal boilerplate
pub struct TestRuntime {
    pub manager: TestManager,
    pub store: Arc<InMemorySessionStore>,
    pub transport: Arc<RecordingTransport>,
    pub services: Arc<MockServices>,
}

impl TestRuntime {
    pub fn new(services: MockServices) -> Self {
        Self::with_timeout(services, Duration::from_secs(2))
    }

    pub fn with_timeout(services: MockServices, adapter_timeout: Duration) -> Self {
        Self::build(services, adapter_timeout, super::DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(services: MockServices, idle_timeout: Duration) -> Self {
        Self::build(services, Duration::from_secs(2), idle_timeout)
    }

    fn build(services: MockServices, adapter_timeout: Duration, idle_timeout: Duration) -> Self {
        let store = Arc::new(InMemorySessionStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let services = Arc::new(services);
        let manager = DialogManager::new(
            store.clone(),
            transport.clone(),
            services.clone().into_set(),
            adapter_timeout,
        )
        .with_idle_timeout(idle_timeout);
        Self {
            manager,
            store,
            transport,
            services,
        }
    }

    pub async fn send(&self, chat_id: ChatId, event: Event) {
        self.manager
            .dispatch(Incoming {
                chat_id,
                user_name: Some("Tester".to_string()),
                event,
            })
            .await
            .expect("Failed to dispatch event");
    }

    /// Wait until the chat has received `count` items in total
    pub async fn wait_for(&self, chat_id: ChatId, count: usize) -> bool {
        self.transport
            .wait_for(chat_id, count, Duration::from_secs(2))
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{TOKEN_CREATE_POLL, TOKEN_CURRENCY, TOKEN_PET, TOKEN_POLL, TOKEN_WEATHER};
    use crate::state_machine::state::MAX_POLL_QUESTION_CHARS;
    use crate::state_machine::{DialogState, Session};

    const CHAT: ChatId = ChatId(42);

    async fn session_of(rt: &TestRuntime, chat_id: ChatId) -> Session {
        rt.store.get_session(chat_id).await.unwrap()
    }

    #[tokio::test]
    async fn test_recording_transport_keeps_order() {
        let transport = RecordingTransport::new();
        transport.send_prompt(CHAT, &Prompt::text("one")).await.unwrap();
        transport.send_prompt(ChatId(1), &Prompt::text("elsewhere")).await.unwrap();
        transport.send_prompt(CHAT, &Prompt::text("two")).await.unwrap();
        assert_eq!(transport.texts_to(CHAT), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_mock_services_default_to_unavailable() {
        let services = MockServices::new();
        let err = services.random_image_url().await.unwrap_err();
        assert!(err.is_soft());
        assert_eq!(services.recorded_calls(), vec![ServiceCall::RandomPetImage]);
    }

    /// Integration test: greeting on /start
    #[tokio::test]
    async fn test_start_command_greets() {
        let rt = TestRuntime::new(MockServices::new());
        rt.send(CHAT, Event::from_message_text("/start")).await;

        assert!(rt.wait_for(CHAT, 1).await);
        assert_eq!(rt.transport.texts_to(CHAT), vec!["Hello, Tester!"]);
        assert_eq!(session_of(&rt, CHAT).await, Session::start());
    }

    /// Integration test: pet picture round trip
    #[tokio::test]
    async fn test_pet_image_is_sent_once() {
        let services = MockServices::new();
        let url = "https://3zvzd.blob.core.windows.net/mimimi/77.jpg";
        services.queue_image(Ok(url.to_string()));

        let rt = TestRuntime::new(services);
        rt.send(CHAT, Event::selection(TOKEN_PET, MessageId(5))).await;

        assert!(rt.wait_for(CHAT, 2).await);
        let sent = rt.transport.sent_to(CHAT);
        let images: Vec<_> = sent
            .iter()
            .filter(|s| matches!(s, Sent::Image(..)))
            .collect();
        assert_eq!(images, vec![&Sent::Image(CHAT, url.to_string())]);
        assert!(sent.contains(&Sent::Deleted(CHAT, MessageId(5))));
        assert_eq!(session_of(&rt, CHAT).await, Session::start());
    }

    /// Integration test: conversion reaches the adapter with parsed values
    #[tokio::test]
    async fn test_conversion_wizard_calls_adapter() {
        let services = MockServices::new();
        services.queue_conversion(Ok(ConversionResult {
            base: "USD".to_string(),
            target: "EUR".to_string(),
            amount: 10.0,
            result: 9.25,
        }));

        let rt = TestRuntime::new(services);
        rt.send(CHAT, Event::selection(TOKEN_CURRENCY, MessageId(1))).await;
        rt.send(CHAT, Event::selection("USD", MessageId(2))).await;
        rt.send(CHAT, Event::selection("EUR", MessageId(3))).await;
        rt.send(CHAT, Event::text("10,0")).await;

        // 3 prompts + 3 deletions + the result
        assert!(rt.wait_for(CHAT, 7).await);
        assert_eq!(
            rt.services.recorded_calls(),
            vec![ServiceCall::ConvertCurrency {
                base: "USD".to_string(),
                target: "EUR".to_string(),
                amount: 10.0,
            }]
        );
        assert_eq!(
            rt.transport.texts_to(CHAT).last().map(String::as_str),
            Some("10 USD = 9.25 EUR")
        );
        assert_eq!(session_of(&rt, CHAT).await, Session::start());
    }

    /// Integration test: invalid amount keeps the wizard open
    #[tokio::test]
    async fn test_invalid_amount_keeps_state() {
        let rt = TestRuntime::new(MockServices::new());
        rt.send(CHAT, Event::selection(TOKEN_CURRENCY, MessageId(1))).await;
        rt.send(CHAT, Event::selection("USD", MessageId(2))).await;
        rt.send(CHAT, Event::selection("EUR", MessageId(3))).await;
        rt.send(CHAT, Event::text("abc")).await;

        assert!(rt.wait_for(CHAT, 7).await);
        assert!(rt.services.recorded_calls().is_empty());
        assert_eq!(
            session_of(&rt, CHAT).await.state,
            DialogState::CurrencyAmount
        );
    }

    /// Integration test: publishing into an unknown chat
    #[tokio::test]
    async fn test_chat_not_found_aborts_poll() {
        let services = MockServices::new();
        services.queue_poll(Err(ServiceError::chat_not_found("chat not found")));

        let rt = TestRuntime::new(services);
        rt.send(CHAT, Event::selection(TOKEN_POLL, MessageId(1))).await;
        rt.send(CHAT, Event::text("-100500")).await;
        rt.send(CHAT, Event::text("Lunch?")).await;
        rt.send(CHAT, Event::text("Pizza")).await;
        rt.send(CHAT, Event::text("Sushi")).await;
        rt.send(CHAT, Event::text(crate::render::PROCEED_TO_OPTIONS_TEXT)).await;

        // Wait for the options menu before pressing create
        assert!(rt.wait_for(CHAT, 7).await);
        rt.send(CHAT, Event::selection(TOKEN_CREATE_POLL, MessageId(200))).await;

        assert!(rt.wait_for(CHAT, 9).await);
        assert_eq!(
            rt.transport.texts_to(CHAT).last().map(String::as_str),
            Some("Error. The chat does not exist, or the bot has not been added to it.")
        );
        assert_eq!(session_of(&rt, CHAT).await, Session::start());

        match &rt.services.recorded_calls()[..] {
            [ServiceCall::PublishPoll(draft)] => {
                assert_eq!(draft.chat_id, "-100500");
                assert_eq!(draft.answers, vec!["Pizza", "Sushi"]);
                assert!(draft.is_anonymous);
            }
            other => panic!("Expected one poll publication, got {other:?}"),
        }
    }

    /// Integration test: an adapter that never answers
    #[tokio::test]
    async fn test_adapter_timeout_is_soft_failure() {
        let services = MockServices::new().with_delay(Duration::from_secs(5));
        let rt = TestRuntime::with_timeout(services, Duration::from_millis(50));

        rt.send(CHAT, Event::selection(TOKEN_PET, MessageId(1))).await;

        assert!(rt.wait_for(CHAT, 2).await);
        let texts = rt.transport.texts_to(CHAT);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("unavailable"));
        assert_eq!(session_of(&rt, CHAT).await, Session::start());
    }

    /// Integration test: users do not share sessions
    #[tokio::test]
    async fn test_sessions_are_independent() {
        let rt = TestRuntime::new(MockServices::new());
        let other = ChatId(7);

        rt.send(CHAT, Event::selection(TOKEN_CURRENCY, MessageId(1))).await;
        rt.send(other, Event::selection(TOKEN_POLL, MessageId(1))).await;

        assert!(rt.wait_for(CHAT, 2).await);
        assert!(rt.wait_for(other, 2).await);
        assert_eq!(session_of(&rt, CHAT).await.state, DialogState::BaseCurrency);
        assert_eq!(session_of(&rt, other).await.state, DialogState::PollChatId);
        assert_eq!(rt.manager.active_sessions().await, 2);
    }

    /// Integration test: one user's events apply in arrival order
    #[tokio::test]
    async fn test_events_apply_in_order() {
        let rt = TestRuntime::new(MockServices::new());
        rt.send(CHAT, Event::selection(TOKEN_POLL, MessageId(1))).await;
        rt.send(CHAT, Event::text("-1")).await;
        rt.send(CHAT, Event::text("Q")).await;
        for answer in ["a", "b", "c"] {
            rt.send(CHAT, Event::text(answer)).await;
        }

        // poll prompt + delete + question prompt + answer prompt + 3 answer prompts
        assert!(rt.wait_for(CHAT, 7).await);
        assert_eq!(
            session_of(&rt, CHAT).await.fields.poll_answers,
            vec!["a", "b", "c"]
        );
    }

    /// Integration test: a chat stuck on a slow service does not hold up others
    #[tokio::test]
    async fn test_busy_chat_does_not_block_dispatch() {
        let services = MockServices::new().with_delay(Duration::from_secs(3));
        let rt = TestRuntime::with_timeout(services, Duration::from_secs(5));
        let other = ChatId(7);

        let flood = async {
            rt.send(CHAT, Event::selection(TOKEN_PET, MessageId(1))).await;
            for i in 0..40 {
                rt.send(CHAT, Event::text(format!("hello {i}"))).await;
            }
            rt.send(other, Event::text("hi")).await;
        };
        assert!(
            tokio::time::timeout(Duration::from_millis(1500), flood)
                .await
                .is_ok(),
            "dispatch waited on a busy chat"
        );

        assert!(rt.wait_for(other, 1).await);
        assert_eq!(rt.transport.texts_to(other), vec!["Hello, Tester!"]);
    }

    /// Integration test: an event the current state does not accept
    #[tokio::test]
    async fn test_unaccepted_event_changes_nothing() {
        let rt = TestRuntime::new(MockServices::new());
        rt.send(CHAT, Event::selection(TOKEN_POLL, MessageId(1))).await;
        rt.send(CHAT, Event::text("-100500")).await;
        assert!(rt.wait_for(CHAT, 3).await);
        let before = session_of(&rt, CHAT).await;
        assert_eq!(before.state, DialogState::PollQuestion);

        // Menu buttons are not accepted while a question is expected
        rt.send(CHAT, Event::selection(TOKEN_PET, MessageId(2))).await;
        // Rejected question text re-prompts without changing the session
        rt.send(CHAT, Event::text("x".repeat(MAX_POLL_QUESTION_CHARS + 1))).await;

        assert!(rt.wait_for(CHAT, 4).await);
        let sent = rt.transport.sent_to(CHAT);
        assert_eq!(sent.len(), 4);
        assert!(matches!(sent[3], Sent::Prompt(..)));
        assert!(rt.services.recorded_calls().is_empty());
        assert_eq!(session_of(&rt, CHAT).await, before);
    }

    /// Integration test: idle runtimes retire and come back on demand
    #[tokio::test]
    async fn test_idle_runtime_retires() {
        let rt = TestRuntime::with_idle_timeout(MockServices::new(), Duration::from_millis(100));
        rt.send(CHAT, Event::selection(TOKEN_CURRENCY, MessageId(1))).await;
        rt.send(ChatId(7), Event::from_message_text("/start")).await;
        assert!(rt.wait_for(CHAT, 2).await);
        assert!(rt.wait_for(ChatId(7), 1).await);
        assert_eq!(rt.manager.active_sessions().await, 2);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while rt.manager.active_sessions().await > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(rt.manager.active_sessions().await, 0);
        // Only the unfinished dialog is still stored
        assert_eq!(rt.store.session_count().await, 1);

        // A retired chat resumes where it left off
        rt.send(CHAT, Event::selection("USD", MessageId(2))).await;
        assert!(rt.wait_for(CHAT, 4).await);
        let session = session_of(&rt, CHAT).await;
        assert_eq!(session.state, DialogState::TargetCurrency);
        assert_eq!(session.fields.base_currency.as_deref(), Some("USD"));
    }

    /// Integration test: a retiring runtime never loses an event
    #[tokio::test]
    async fn test_events_survive_retirement_race() {
        let rt = TestRuntime::with_idle_timeout(MockServices::new(), Duration::from_millis(1));
        rt.send(CHAT, Event::selection(TOKEN_WEATHER, MessageId(1))).await;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(1)).await;
            rt.send(CHAT, Event::text("Moscow")).await;
        }
        rt.send(CHAT, Event::text(crate::render::CANCEL_TEXT)).await;

        // weather prompt + delete + cancelled + start menu
        assert!(rt.wait_for(CHAT, 4).await);
        assert_eq!(session_of(&rt, CHAT).await, Session::start());
    }
}
