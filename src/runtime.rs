//! Runtime for executing dialogs
//!
//! One `SessionRuntime` task per chat serializes that user's events; different
//! users are handled concurrently.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::services::ServiceSet;
use crate::state_machine::{ChatContext, ChatId, Event};
use crate::telegram::TelegramClient;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

/// Type alias for the production manager with concrete implementations
pub type ProductionManager = DialogManager<Arc<InMemorySessionStore>, Arc<TelegramClient>>;

/// A platform update reduced to what the dialog engine needs
#[derive(Debug, Clone, PartialEq)]
pub struct Incoming {
    pub chat_id: ChatId,
    /// Sender's first name, when the update carries one
    pub user_name: Option<String>,
    pub event: Event,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub event_tx: mpsc::UnboundedSender<Incoming>,
}

/// Live runtimes by chat; a runtime removes its own entry when it retires
pub type SessionRegistry = Arc<RwLock<HashMap<ChatId, SessionHandle>>>;

/// How long a runtime waits for another event before retiring
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Manager for all session runtimes
pub struct DialogManager<S, T>
where
    S: SessionStore + Clone + 'static,
    T: Transport + Clone + 'static,
{
    store: S,
    transport: T,
    services: ServiceSet,
    adapter_timeout: Duration,
    idle_timeout: Duration,
    runtimes: SessionRegistry,
}

impl<S, T> DialogManager<S, T>
where
    S: SessionStore + Clone + 'static,
    T: Transport + Clone + 'static,
{
    pub fn new(store: S, transport: T, services: ServiceSet, adapter_timeout: Duration) -> Self {
        Self {
            store,
            transport,
            services,
            adapter_timeout,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            runtimes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Route an update to its chat's runtime, starting one if needed.
    ///
    /// Never waits on the runtime itself: the queue is unbounded, so a chat
    /// stuck behind a slow service call cannot hold up anyone else. Sends
    /// happen under the registry lock, which a retiring runtime also takes,
    /// so an event is never queued to a runtime that has already left.
    pub async fn dispatch(&self, incoming: Incoming) -> Result<(), String> {
        let chat_id = incoming.chat_id;

        let incoming = {
            let runtimes = self.runtimes.read().await;
            match runtimes.get(&chat_id) {
                Some(handle) => match handle.event_tx.send(incoming) {
                    Ok(()) => return Ok(()),
                    Err(mpsc::error::SendError(incoming)) => incoming,
                },
                None => incoming,
            }
        };

        let mut runtimes = self.runtimes.write().await;
        // Another update for this chat may have won the race
        let incoming = match runtimes.get(&chat_id) {
            Some(handle) => match handle.event_tx.send(incoming) {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(incoming)) => {
                    tracing::warn!(chat_id = %chat_id, "Replacing stopped session runtime");
                    incoming
                }
            },
            None => incoming,
        };

        let handle = self.spawn_runtime(chat_id).await?;
        handle
            .event_tx
            .send(incoming)
            .map_err(|e| format!("Failed to send event: {e}"))?;
        runtimes.insert(chat_id, handle);
        Ok(())
    }

    async fn spawn_runtime(&self, chat_id: ChatId) -> Result<SessionHandle, String> {
        let session = self.store.get_session(chat_id).await?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let runtime = SessionRuntime::new(
            ChatContext::new(chat_id),
            session,
            self.store.clone(),
            self.transport.clone(),
            self.services.clone(),
            self.adapter_timeout,
            event_rx,
        );

        let registry = self.runtimes.clone();
        let idle_timeout = self.idle_timeout;
        tokio::spawn(async move {
            runtime.run(registry, idle_timeout).await;
            tracing::info!(chat_id = %chat_id, "Session runtime finished");
        });

        Ok(SessionHandle { event_tx })
    }

    /// Number of chats with a live runtime
    pub async fn active_sessions(&self) -> usize {
        self.runtimes.read().await.len()
    }
}
