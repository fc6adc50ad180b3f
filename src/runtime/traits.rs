//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::render::Prompt;
use crate::state_machine::{ChatId, MessageId, Session};
use crate::telegram::TransportError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage for per-user dialog sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current session for a chat; chats never seen before start at `Start`
    async fn get_session(&self, chat_id: ChatId) -> Result<Session, String>;

    /// Replace the session for a chat
    async fn update_session(&self, chat_id: ChatId, session: &Session) -> Result<(), String>;
}

/// Outbound side of the chat platform
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_prompt(&self, chat_id: ChatId, prompt: &Prompt) -> Result<(), TransportError>;

    async fn send_image(&self, chat_id: ChatId, url: &str) -> Result<(), TransportError>;

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get_session(&self, chat_id: ChatId) -> Result<Session, String> {
        (**self).get_session(chat_id).await
    }

    async fn update_session(&self, chat_id: ChatId, session: &Session) -> Result<(), String> {
        (**self).update_session(chat_id, session).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send_prompt(&self, chat_id: ChatId, prompt: &Prompt) -> Result<(), TransportError> {
        (**self).send_prompt(chat_id, prompt).await
    }

    async fn send_image(&self, chat_id: ChatId, url: &str) -> Result<(), TransportError> {
        (**self).send_image(chat_id, url).await
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        (**self).delete_message(chat_id, message_id).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Process-local session store; sessions do not survive a restart
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<ChatId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_session(&self, chat_id: ChatId) -> Result<Session, String> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&chat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_session(&self, chat_id: ChatId, session: &Session) -> Result<(), String> {
        let mut sessions = self.sessions.write().await;
        // A fresh session is what an unknown chat reads anyway
        if *session == Session::start() {
            sessions.remove(&chat_id);
        } else {
            sessions.insert(chat_id, session.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
impl InMemorySessionStore {
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
