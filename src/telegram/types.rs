//! Bot API payloads
//!
//! Only the fields the bot reads are modelled; serde ignores the rest.

use crate::render::{Keyboard, ReplyButton};
use crate::runtime::Incoming;
use crate::state_machine::{ChatId, Event, MessageId};
use serde::Deserialize;
use serde_json::{json, Value};

/// Envelope around every Bot API reply
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    /// Absent when the menu message is too old
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// Reduce an update to a dialog event; anything the dialogs do not use is dropped
pub fn normalize(update: &Update) -> Option<Incoming> {
    if let Some(query) = &update.callback_query {
        let message = query.message.as_ref()?;
        let token = query.data.clone()?;
        return Some(Incoming {
            chat_id: ChatId(message.chat.id),
            user_name: Some(query.from.first_name.clone()),
            event: Event::selection(token, MessageId(message.message_id)),
        });
    }

    let message = update.message.as_ref()?;
    let event = if let Some(location) = &message.location {
        Event::Location {
            latitude: location.latitude,
            longitude: location.longitude,
        }
    } else {
        Event::from_message_text(message.text.as_deref()?)
    };

    Some(Incoming {
        chat_id: ChatId(message.chat.id),
        user_name: message.from.as_ref().map(|u| u.first_name.clone()),
        event,
    })
}

/// `reply_markup` for a keyboard, if it needs one
pub fn reply_markup(keyboard: &Keyboard) -> Option<Value> {
    match keyboard {
        Keyboard::None => None,
        Keyboard::Options(menu) => {
            let rows: Vec<Value> = menu
                .rows()
                .map(|row| {
                    row.iter()
                        .map(|option| json!({ "text": option.label, "callback_data": option.token }))
                        .collect()
                })
                .collect();
            Some(json!({ "inline_keyboard": rows }))
        }
        Keyboard::Reply(buttons) => {
            let rows: Vec<Value> = buttons
                .iter()
                .map(|button| match button {
                    ReplyButton::Text(text) => json!([{ "text": text }]),
                    ReplyButton::RequestLocation(text) => {
                        json!([{ "text": text, "request_location": true }])
                    }
                })
                .collect();
            Some(json!({
                "keyboard": rows,
                "resize_keyboard": true,
                "one_time_keyboard": true,
            }))
        }
        Keyboard::RemoveReply => Some(json!({ "remove_keyboard": true })),
    }
}
