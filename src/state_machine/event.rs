//! Events that can occur in a dialog

use crate::services::{ConversionResult, ServiceError, WeatherReport};
use crate::state_machine::state::MessageId;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // User events
    /// `/name` typed by the user
    Command { name: String },
    Text { content: String },
    /// Button press on an option menu
    Selection {
        token: String,
        /// Message carrying the menu, deleted once the press is handled
        message_id: MessageId,
    },
    Location { latitude: f64, longitude: f64 },

    // Service events
    ServiceReply(ServiceReply),
}

impl Event {
    /// Classify a free-form message: `/start@my_bot now` is `Command("start")`
    pub fn from_message_text(text: &str) -> Self {
        if let Some(rest) = text.strip_prefix('/') {
            let word = rest.split(char::is_whitespace).next().unwrap_or_default();
            let name = word.split('@').next().unwrap_or_default();
            if !name.is_empty() {
                return Event::Command {
                    name: name.to_lowercase(),
                };
            }
        }
        Event::text(text)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Event::Text {
            content: content.into(),
        }
    }

    pub fn selection(token: impl Into<String>, message_id: MessageId) -> Self {
        Event::Selection {
            token: token.into(),
            message_id,
        }
    }

    /// Short tag for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Command { .. } => "command",
            Event::Text { .. } => "text",
            Event::Selection { .. } => "selection",
            Event::Location { .. } => "location",
            Event::ServiceReply(_) => "service_reply",
        }
    }
}

/// Outcome of an adapter invocation, fed back into the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceReply {
    Weather(Result<WeatherReport, ServiceError>),
    Conversion(Result<ConversionResult, ServiceError>),
    PetImage(Result<String, ServiceError>),
    PollPublished(Result<(), ServiceError>),
}
