//! Effects produced by state transitions

use crate::render::Prompt;
use crate::state_machine::state::{MessageId, PollDraft};

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a text message, optionally with a keyboard attached
    SendPrompt(Prompt),

    /// Send an image by URL
    SendImage { url: String },

    /// Delete a message previously sent into the chat
    DeleteMessage { message_id: MessageId },

    /// Invoke an external service; its outcome comes back as `Event::ServiceReply`
    CallService(ServiceCall),
}

/// Adapter invocations the runtime performs on behalf of the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    FetchWeather { latitude: f64, longitude: f64 },
    ConvertCurrency {
        base: String,
        target: String,
        amount: f64,
    },
    RandomPetImage,
    PublishPoll(PollDraft),
}

impl ServiceCall {
    /// Short tag for logs
    pub fn name(&self) -> &'static str {
        match self {
            ServiceCall::FetchWeather { .. } => "weather",
            ServiceCall::ConvertCurrency { .. } => "currency",
            ServiceCall::RandomPetImage => "pet_image",
            ServiceCall::PublishPoll(_) => "publish_poll",
        }
    }
}

impl Effect {
    pub fn prompt(prompt: Prompt) -> Self {
        Effect::SendPrompt(prompt)
    }

    pub fn delete(message_id: MessageId) -> Self {
        Effect::DeleteMessage { message_id }
    }

    pub fn call(call: ServiceCall) -> Self {
        Effect::CallService(call)
    }
}
