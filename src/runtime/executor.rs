//! Session runtime executor

use super::traits::{SessionStore, Transport};
use super::{Incoming, SessionRegistry};

use crate::services::{ServiceError, ServiceSet};
use crate::state_machine::{
    transition, ChatContext, Effect, Event, ServiceCall, ServiceReply, Session, TransitionError,
};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Runs one user's dialog: events are handled strictly one at a time
pub struct SessionRuntime<S, T>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    context: ChatContext,
    session: Session,
    store: S,
    transport: T,
    services: ServiceSet,
    /// Upper bound on a single adapter call
    adapter_timeout: Duration,
    event_rx: mpsc::UnboundedReceiver<Incoming>,
}

impl<S, T> SessionRuntime<S, T>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    pub fn new(
        context: ChatContext,
        session: Session,
        store: S,
        transport: T,
        services: ServiceSet,
        adapter_timeout: Duration,
        event_rx: mpsc::UnboundedReceiver<Incoming>,
    ) -> Self {
        Self {
            context,
            session,
            store,
            transport,
            services,
            adapter_timeout,
            event_rx,
        }
    }

    /// Handle events until the runtime has been idle for `idle_timeout`
    pub async fn run(mut self, registry: SessionRegistry, idle_timeout: Duration) {
        let chat_id = self.context.chat_id;
        tracing::info!(chat_id = %chat_id, "Starting session runtime");

        loop {
            let incoming = match tokio::time::timeout(idle_timeout, self.event_rx.recv()).await {
                Ok(Some(incoming)) => incoming,
                Ok(None) => break,
                Err(_) => {
                    // Dispatch only sends under this lock, so an empty queue stays empty
                    let mut runtimes = registry.write().await;
                    let Ok(incoming) = self.event_rx.try_recv() else {
                        runtimes.remove(&chat_id);
                        self.event_rx.close();
                        tracing::info!(chat_id = %chat_id, state = ?self.session.state, "Retiring idle session runtime");
                        break;
                    };
                    incoming
                }
            };

            if incoming.user_name.is_some() {
                self.context.user_name = incoming.user_name;
            }
            if let Err(e) = self.process_event(incoming.event).await {
                tracing::error!(chat_id = %chat_id, error = %e, "Error handling event");
            }
        }

        tracing::info!(chat_id = %chat_id, "Session runtime stopped");
    }

    async fn process_event(&mut self, event: Event) -> Result<(), String> {
        // Service replies are fed back through the same loop
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = match transition(&self.session, &self.context, current_event) {
                Ok(r) => r,
                Err(TransitionError::Unhandled { state, event }) => {
                    tracing::debug!(
                        chat_id = %self.context.chat_id,
                        ?state,
                        event,
                        "Ignoring event"
                    );
                    continue;
                }
                Err(e) => {
                    tracing::warn!(chat_id = %self.context.chat_id, error = %e, "Rejected event");
                    continue;
                }
            };

            if result.new_session != self.session {
                self.store
                    .update_session(self.context.chat_id, &result.new_session)
                    .await?;
                tracing::debug!(
                    chat_id = %self.context.chat_id,
                    from = ?self.session.state,
                    to = ?result.new_session.state,
                    "State transition"
                );
                if result.new_session.state.is_start() && !self.session.state.is_start() {
                    tracing::info!(chat_id = %self.context.chat_id, from = ?self.session.state, "Dialog finished");
                }
                self.session = result.new_session;
            }

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&self, effect: Effect) -> Option<Event> {
        let chat_id = self.context.chat_id;
        match effect {
            Effect::SendPrompt(prompt) => {
                if let Err(e) = self.transport.send_prompt(chat_id, &prompt).await {
                    tracing::error!(chat_id = %chat_id, error = %e, "Failed to send prompt");
                }
                None
            }

            Effect::SendImage { url } => {
                if let Err(e) = self.transport.send_image(chat_id, &url).await {
                    tracing::error!(chat_id = %chat_id, error = %e, "Failed to send image");
                }
                None
            }

            Effect::DeleteMessage { message_id } => {
                // The message may already be gone; nothing to do about it
                if let Err(e) = self.transport.delete_message(chat_id, message_id).await {
                    tracing::debug!(chat_id = %chat_id, message_id = message_id.0, error = %e, "Failed to delete message");
                }
                None
            }

            Effect::CallService(call) => {
                let name = call.name();
                let started = Instant::now();
                let reply = self.call_service(call).await;
                let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                match reply_error(&reply) {
                    Some(e) if e.is_soft() => tracing::warn!(
                        chat_id = %chat_id,
                        service = name,
                        duration_ms,
                        error = %e,
                        "Service unavailable"
                    ),
                    Some(e) => tracing::info!(
                        chat_id = %chat_id,
                        service = name,
                        duration_ms,
                        kind = ?e.kind,
                        error = %e,
                        "Service refused request"
                    ),
                    None => tracing::info!(chat_id = %chat_id, service = name, duration_ms, "Service call completed"),
                }
                Some(Event::ServiceReply(reply))
            }
        }
    }

    async fn call_service(&self, call: ServiceCall) -> ServiceReply {
        let limit = self.adapter_timeout;
        match call {
            ServiceCall::FetchWeather {
                latitude,
                longitude,
            } => ServiceReply::Weather(
                with_timeout(limit, self.services.weather.fetch_weather(latitude, longitude)).await,
            ),
            ServiceCall::ConvertCurrency {
                base,
                target,
                amount,
            } => ServiceReply::Conversion(
                with_timeout(limit, self.services.currency.convert(&base, &target, amount)).await,
            ),
            ServiceCall::RandomPetImage => ServiceReply::PetImage(
                with_timeout(limit, self.services.images.random_image_url()).await,
            ),
            ServiceCall::PublishPoll(draft) => ServiceReply::PollPublished(
                with_timeout(limit, self.services.polls.publish_poll(&draft)).await,
            ),
        }
    }
}

/// A call that outlives `limit` counts as the service being unavailable
async fn with_timeout<R>(
    limit: Duration,
    call: impl Future<Output = Result<R, ServiceError>>,
) -> Result<R, ServiceError> {
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        Err(ServiceError::unavailable(format!(
            "No response within {}ms",
            limit.as_millis()
        )))
    })
}

fn reply_error(reply: &ServiceReply) -> Option<&ServiceError> {
    match reply {
        ServiceReply::Weather(Err(e))
        | ServiceReply::Conversion(Err(e))
        | ServiceReply::PetImage(Err(e))
        | ServiceReply::PollPublished(Err(e)) => Some(e),
        _ => None,
    }
}
