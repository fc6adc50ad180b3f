//! Pure state transition function
//!
//! Given the same session, context and event this always produces the same
//! outcome, with no I/O. Service calls are requested as effects and their
//! outcomes come back later as `Event::ServiceReply`.

use super::effect::ServiceCall;
use super::event::ServiceReply;
use super::state::{
    PollDraft, SessionFields, MAX_POLL_ANSWERS, MAX_POLL_ANSWER_CHARS, MAX_POLL_QUESTION_CHARS,
    MIN_POLL_ANSWERS,
};
use super::{ChatContext, DialogState, Effect, Event, Session};
use crate::currency;
use crate::render::{
    self, CANCEL_TEXT, PROCEED_TO_OPTIONS_TEXT, TOKEN_CREATE_POLL, TOKEN_CURRENCY, TOKEN_PET,
    TOKEN_POLL, TOKEN_TOGGLE_ANONYMOUS, TOKEN_TOGGLE_MULTIPLE, TOKEN_WEATHER,
};
use thiserror::Error;

const START_COMMAND: &str = "start";

/// Result of a state transition
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub new_session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            new_session: session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The event is not part of the state's transition set
    #[error("No transition from {state:?} on {event} event")]
    Unhandled {
        state: DialogState,
        event: &'static str,
    },
    #[error("Session is missing {0}")]
    MissingField(&'static str),
}

/// Pure transition function
#[allow(clippy::too_many_lines)] // One arm per row of the transition table
pub fn transition(
    session: &Session,
    context: &ChatContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let fields = &session.fields;

    match (session.state, event) {
        // ============================================================
        // Any state
        // ============================================================

        // `/start` abandons whatever wizard is in progress
        (_, Event::Command { name }) if name == START_COMMAND => Ok(greet(context)),

        (_, Event::ServiceReply(reply)) => {
            Ok(TransitionResult::new(session.clone()).with_effects(reply_effects(reply)))
        }

        // ============================================================
        // Main menu
        // ============================================================
        (DialogState::Start, Event::Selection { token, message_id }) => {
            let result = match token.as_str() {
                TOKEN_WEATHER => enter(DialogState::Location, SessionFields::default()),
                TOKEN_CURRENCY => enter(DialogState::BaseCurrency, SessionFields::default()),
                TOKEN_POLL => enter(DialogState::PollChatId, SessionFields::default()),
                TOKEN_PET => TransitionResult::new(Session::start())
                    .with_effect(Effect::call(ServiceCall::RandomPetImage)),
                _ => return Err(unhandled(session, "selection")),
            };
            Ok(result.with_effect(Effect::delete(message_id)))
        }

        // Typing anything at the main menu shows it again
        (DialogState::Start, Event::Text { .. } | Event::Command { .. }) => Ok(greet(context)),

        // ============================================================
        // Weather
        // ============================================================
        (DialogState::Location, Event::Text { content }) if content == CANCEL_TEXT => {
            Ok(TransitionResult::new(Session::start())
                .with_effect(Effect::prompt(render::location_cancelled()))
                .with_effect(Effect::prompt(render::start_menu(
                    context.user_name.as_deref(),
                ))))
        }

        (
            DialogState::Location,
            Event::Location {
                latitude,
                longitude,
            },
        ) => Ok(TransitionResult::new(Session::start()).with_effect(Effect::call(
            ServiceCall::FetchWeather {
                latitude,
                longitude,
            },
        ))),

        // ============================================================
        // Currency conversion
        // ============================================================
        (DialogState::BaseCurrency, Event::Selection { token, message_id })
            if currency::is_supported(&token) =>
        {
            let fields = SessionFields {
                base_currency: Some(token),
                ..SessionFields::default()
            };
            Ok(enter(DialogState::TargetCurrency, fields).with_effect(Effect::delete(message_id)))
        }

        // Same code as the base is allowed and converts 1:1
        (DialogState::TargetCurrency, Event::Selection { token, message_id })
            if currency::is_supported(&token) =>
        {
            let fields = SessionFields {
                target_currency: Some(token),
                ..fields.clone()
            };
            Ok(enter(DialogState::CurrencyAmount, fields).with_effect(Effect::delete(message_id)))
        }

        (DialogState::CurrencyAmount, Event::Text { content }) => {
            let Some(amount) = currency::parse_amount(&content) else {
                return Ok(stay(session, render::invalid_amount()));
            };
            let fields = SessionFields {
                amount: Some(amount),
                ..fields.clone()
            };
            Ok(TransitionResult::new(Session::start())
                .with_effect(Effect::call(conversion_call(&fields)?)))
        }

        // ============================================================
        // Poll creation
        // ============================================================
        (DialogState::PollChatId, Event::Text { content }) => {
            let chat_id = content.trim();
            if chat_id.is_empty() {
                return Ok(stay(session, render::empty_chat_id()));
            }
            Ok(enter(
                DialogState::PollQuestion,
                SessionFields::poll_draft(chat_id),
            ))
        }

        (DialogState::PollQuestion, Event::Text { content }) => {
            if content.chars().count() > MAX_POLL_QUESTION_CHARS {
                return Ok(stay(session, render::text_too_long(MAX_POLL_QUESTION_CHARS)));
            }
            let fields = SessionFields {
                poll_question: Some(content),
                ..fields.clone()
            };
            Ok(enter(DialogState::PollAnswer, fields))
        }

        (DialogState::PollAnswer, Event::Text { content }) if content == PROCEED_TO_OPTIONS_TEXT => {
            if fields.poll_answers.len() < MIN_POLL_ANSWERS {
                return Ok(stay(session, render::too_few_answers()));
            }
            Ok(enter(DialogState::PollOptions, fields.clone()))
        }

        (DialogState::PollAnswer, Event::Text { content }) => {
            if fields.poll_answers.len() >= MAX_POLL_ANSWERS {
                return Ok(enter(DialogState::PollOptions, fields.clone()));
            }
            if content.chars().count() > MAX_POLL_ANSWER_CHARS {
                return Ok(stay(session, render::text_too_long(MAX_POLL_ANSWER_CHARS)));
            }

            let mut fields = fields.clone();
            fields.poll_answers.push(content);

            let next = if fields.poll_answers.len() >= MAX_POLL_ANSWERS {
                DialogState::PollOptions
            } else {
                DialogState::PollAnswer
            };
            Ok(enter(next, fields))
        }

        (DialogState::PollOptions, Event::Selection { token, message_id }) => {
            let mut fields = fields.clone();
            let result = match token.as_str() {
                TOKEN_TOGGLE_ANONYMOUS => {
                    fields.poll_is_anonymous = !fields.poll_is_anonymous;
                    enter(DialogState::PollOptions, fields)
                }
                TOKEN_TOGGLE_MULTIPLE => {
                    fields.poll_allows_multiple_answers = !fields.poll_allows_multiple_answers;
                    enter(DialogState::PollOptions, fields)
                }
                TOKEN_CREATE_POLL => TransitionResult::new(Session::start())
                    .with_effect(Effect::call(ServiceCall::PublishPoll(poll_draft(&fields)?))),
                _ => return Err(unhandled(session, "selection")),
            };
            Ok(result.with_effect(Effect::delete(message_id)))
        }

        // ============================================================
        // Everything else is ignored
        // ============================================================
        (state, event) => Err(TransitionError::Unhandled {
            state,
            event: event.kind(),
        }),
    }
}

// Helper functions

/// Move to `state` with `fields` and show that state's prompt
fn enter(state: DialogState, fields: SessionFields) -> TransitionResult {
    let prompt = render::prompt_for(state, &fields);
    TransitionResult::new(Session::new(state, fields)).with_effect(Effect::prompt(prompt))
}

/// Keep the session as it is and tell the user why
fn stay(session: &Session, prompt: render::Prompt) -> TransitionResult {
    TransitionResult::new(session.clone()).with_effect(Effect::prompt(prompt))
}

/// Back to the main menu with a personal greeting
fn greet(context: &ChatContext) -> TransitionResult {
    TransitionResult::new(Session::start()).with_effect(Effect::prompt(render::start_menu(
        context.user_name.as_deref(),
    )))
}

fn unhandled(session: &Session, event: &'static str) -> TransitionError {
    TransitionError::Unhandled {
        state: session.state,
        event,
    }
}

fn reply_effects(reply: ServiceReply) -> Vec<Effect> {
    match reply {
        ServiceReply::Weather(result) => vec![Effect::prompt(render::weather_reply(&result))],
        ServiceReply::Conversion(result) => {
            vec![Effect::prompt(render::conversion_reply(&result))]
        }
        ServiceReply::PetImage(Ok(url)) => vec![Effect::SendImage { url }],
        ServiceReply::PetImage(Err(e)) => vec![Effect::prompt(render::service_failure(&e))],
        ServiceReply::PollPublished(result) => {
            vec![Effect::prompt(render::poll_published_reply(&result))]
        }
    }
}

fn conversion_call(fields: &SessionFields) -> Result<ServiceCall, TransitionError> {
    Ok(ServiceCall::ConvertCurrency {
        base: fields
            .base_currency
            .clone()
            .ok_or(TransitionError::MissingField("base_currency"))?,
        target: fields
            .target_currency
            .clone()
            .ok_or(TransitionError::MissingField("target_currency"))?,
        amount: fields
            .amount
            .ok_or(TransitionError::MissingField("amount"))?,
    })
}

fn poll_draft(fields: &SessionFields) -> Result<PollDraft, TransitionError> {
    Ok(PollDraft {
        chat_id: fields
            .poll_chat_id
            .clone()
            .ok_or(TransitionError::MissingField("poll_chat_id"))?,
        question: fields
            .poll_question
            .clone()
            .ok_or(TransitionError::MissingField("poll_question"))?,
        answers: fields.poll_answers.clone(),
        is_anonymous: fields.poll_is_anonymous,
        allows_multiple_answers: fields.poll_allows_multiple_answers,
    })
}
