//! Per-user dialog state machine
//!
//! Pure transitions over an explicit state enum; all I/O is expressed as effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, ServiceCall};
pub use event::{Event, ServiceReply};
pub use state::{ChatContext, ChatId, DialogState, MessageId, PollDraft, Session, SessionFields};
pub use transition::{transition, TransitionError};
