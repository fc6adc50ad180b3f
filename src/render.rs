//! Prompt rendering
//!
//! Pure functions from dialog state and collected fields to the text and
//! keyboard shown to the user. No I/O happens here.

use crate::currency::{self, SUPPORTED_CURRENCIES};
use crate::services::{ConversionResult, ServiceError, ServiceErrorKind, WeatherReport};
use crate::state_machine::state::MIN_POLL_ANSWERS;
use crate::state_machine::{DialogState, SessionFields};

// Selection tokens carried by option menus
pub const TOKEN_WEATHER: &str = "weather";
pub const TOKEN_CURRENCY: &str = "currency";
pub const TOKEN_PET: &str = "pet";
pub const TOKEN_POLL: &str = "poll";
pub const TOKEN_TOGGLE_ANONYMOUS: &str = "poll_is_anonymous";
pub const TOKEN_TOGGLE_MULTIPLE: &str = "poll_allows_multiple_answers";
pub const TOKEN_CREATE_POLL: &str = "create_poll";

// Reply-keyboard texts that come back as plain text messages
pub const CANCEL_TEXT: &str = "Cancel";
pub const PROCEED_TO_OPTIONS_TEXT: &str = "Go to options";
const SEND_LOCATION_TEXT: &str = "Send location";

const SERVICE_UNAVAILABLE: &str = "The service is unavailable right now. Please try again later.";

/// A message to show the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Prompt {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = keyboard;
        self
    }

    /// Labels of the option menu, empty if the prompt has none
    #[cfg(test)]
    pub fn option_labels(&self) -> Vec<&str> {
        match &self.keyboard {
            Keyboard::Options(menu) => menu.options.iter().map(|o| o.label.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// What is attached below a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    None,
    /// Buttons bound to the message; presses arrive as selections
    Options(OptionMenu),
    /// Buttons replacing the user's keyboard; presses arrive as text or location
    Reply(Vec<ReplyButton>),
    /// Hide a previously shown reply keyboard
    RemoveReply,
}

/// Selectable options with a layout hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMenu {
    pub options: Vec<MenuOption>,
    pub per_row: usize,
}

impl OptionMenu {
    pub fn new(options: Vec<MenuOption>, per_row: usize) -> Self {
        Self {
            options,
            per_row: per_row.max(1),
        }
    }

    /// Options grouped into rows of `per_row`
    pub fn rows(&self) -> impl Iterator<Item = &[MenuOption]> {
        self.options.chunks(self.per_row)
    }
}

/// One selectable option: what the user sees and what comes back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub label: String,
    pub token: String,
}

impl MenuOption {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyButton {
    Text(String),
    /// Shares the user's location when pressed
    RequestLocation(String),
}

// ============================================================================
// State Prompts
// ============================================================================

/// The prompt shown on entering `state` with `fields` collected
pub fn prompt_for(state: DialogState, fields: &SessionFields) -> Prompt {
    match state {
        DialogState::Start => start_menu(None),
        DialogState::Location => location_request(),
        DialogState::BaseCurrency => currency_menu("Choose the base currency"),
        DialogState::TargetCurrency => currency_menu("Choose the target currency"),
        DialogState::CurrencyAmount => amount_request(fields.base_currency.as_deref()),
        DialogState::PollChatId => Prompt::text(POLL_INSTRUCTIONS),
        DialogState::PollQuestion => Prompt::text("Enter the question"),
        DialogState::PollAnswer => answer_request(fields.poll_answers.len()),
        DialogState::PollOptions => poll_options_menu(fields),
    }
}

/// Greeting with the main menu
pub fn start_menu(user_name: Option<&str>) -> Prompt {
    let greeting = match user_name {
        Some(name) if !name.is_empty() => format!("Hello, {name}!"),
        _ => "Hello!".to_string(),
    };
    let menu = OptionMenu::new(
        vec![
            MenuOption::new("Weather", TOKEN_WEATHER),
            MenuOption::new("Currency converter", TOKEN_CURRENCY),
            MenuOption::new("Cats", TOKEN_PET),
            MenuOption::new("Create a poll", TOKEN_POLL),
        ],
        1,
    );
    Prompt::text(greeting).with_keyboard(Keyboard::Options(menu))
}

fn location_request() -> Prompt {
    Prompt::text("Send me your location").with_keyboard(Keyboard::Reply(vec![
        ReplyButton::RequestLocation(SEND_LOCATION_TEXT.to_string()),
        ReplyButton::Text(CANCEL_TEXT.to_string()),
    ]))
}

pub fn location_cancelled() -> Prompt {
    Prompt::text("Cancelled").with_keyboard(Keyboard::RemoveReply)
}

/// One option per supported currency: label is the name, token the code
fn currency_menu(text: &str) -> Prompt {
    let options = SUPPORTED_CURRENCIES
        .iter()
        .map(|(code, name)| MenuOption::new(*name, *code))
        .collect();
    Prompt::text(text).with_keyboard(Keyboard::Options(OptionMenu::new(options, 2)))
}

fn amount_request(base: Option<&str>) -> Prompt {
    match base.and_then(currency::display_name) {
        Some(name) => Prompt::text(format!("Enter the amount in {name}")),
        None => Prompt::text("Enter the amount in the base currency"),
    }
}

pub fn invalid_amount() -> Prompt {
    Prompt::text("Invalid input! Enter the amount in the base currency")
}

pub fn empty_chat_id() -> Prompt {
    Prompt::text("The chat id cannot be empty. Enter the id of the chat to post the poll into")
}

const POLL_INSTRUCTIONS: &str = "Enter the id of the chat to post the poll into.
The bot must already be a member of that chat!
To find the id of a group chat, add @RawDataBot to it and look for
\"chat\": {
    \"id\": ...
in the message it sends.
Remember to remove @RawDataBot once you have the id!";

/// Ask for the next answer; offer to move on once a poll could be published
fn answer_request(collected: usize) -> Prompt {
    match collected {
        0 => Prompt::text("Enter an answer option"),
        n if n < MIN_POLL_ANSWERS => Prompt::text("Add another answer option"),
        _ => Prompt::text(format!("Add another answer option or press {PROCEED_TO_OPTIONS_TEXT}"))
            .with_keyboard(Keyboard::Reply(vec![ReplyButton::Text(
                PROCEED_TO_OPTIONS_TEXT.to_string(),
            )])),
    }
}

/// `[X] label` when set, `[ ] label` otherwise
pub fn checkbox_label(checked: bool, label: &str) -> String {
    let mark = if checked { "[X]" } else { "[ ]" };
    format!("{mark} {label}")
}

fn poll_options_menu(fields: &SessionFields) -> Prompt {
    let menu = OptionMenu::new(
        vec![
            MenuOption::new(
                checkbox_label(fields.poll_is_anonymous, "Anonymous voting"),
                TOKEN_TOGGLE_ANONYMOUS,
            ),
            MenuOption::new(
                checkbox_label(fields.poll_allows_multiple_answers, "Multiple answers"),
                TOKEN_TOGGLE_MULTIPLE,
            ),
            MenuOption::new("Create poll", TOKEN_CREATE_POLL),
        ],
        1,
    );
    Prompt::text("Change the options or finish creating the poll")
        .with_keyboard(Keyboard::Options(menu))
}

pub fn too_few_answers() -> Prompt {
    Prompt::text(format!(
        "A poll needs at least {MIN_POLL_ANSWERS} answer options. Add another one"
    ))
}

pub fn text_too_long(limit: usize) -> Prompt {
    Prompt::text(format!("Too long! Keep it within {limit} characters"))
}

// ============================================================================
// Service Replies
// ============================================================================

/// User-facing text for a failed service call
pub fn service_failure(error: &ServiceError) -> Prompt {
    let text = match error.kind {
        ServiceErrorKind::Unavailable => SERVICE_UNAVAILABLE,
        ServiceErrorKind::RateNotFound => "Exchange rate not found",
        ServiceErrorKind::ImageNotFound => "Couldn't find a picture this time. Please try again.",
        ServiceErrorKind::ChatNotFound => {
            "Error. The chat does not exist, or the bot has not been added to it."
        }
    };
    Prompt::text(text)
}

pub fn weather_reply(result: &Result<WeatherReport, ServiceError>) -> Prompt {
    let prompt = match result {
        Ok(report) => Prompt::text(format!(
            "Weather at your location:\n{}\nTemperature: {}°\nWind: {}, {} m/s",
            report.description, report.temperature, report.wind_direction, report.wind_speed
        )),
        Err(e) => service_failure(e),
    };
    prompt.with_keyboard(Keyboard::RemoveReply)
}

pub fn conversion_reply(result: &Result<ConversionResult, ServiceError>) -> Prompt {
    match result {
        Ok(c) => Prompt::text(format!(
            "{} {} = {} {}",
            c.amount, c.base, c.result, c.target
        )),
        Err(e) => service_failure(e),
    }
}

pub fn poll_published_reply(result: &Result<(), ServiceError>) -> Prompt {
    match result {
        Ok(()) => Prompt::text("Poll created successfully"),
        Err(e) => service_failure(e),
    }
}
