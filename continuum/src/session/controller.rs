//! The session state machine.
//!
//! Three commands drive it: [`SessionController::load`],
//! [`SessionController::submit`] and [`SessionController::reset`]. Each one
//! takes `&self`, so a reset can arrive while a load or submit is awaiting the
//! proxy. State sits behind a mutex that is never held across an `.await`.
//!
//! Every async command captures the current generation before awaiting and
//! commits its result only if the generation is unchanged. Reset bumps the
//! generation, so late results from before a reset are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{messages, MAX_INPUT_LENGTH};
use crate::error::ChatError;
use crate::models::{ConversationHandle, CreateTurnRequest, Role, Transcript};
use crate::proxy::ResponsesProxy;
use crate::storage::KeyValueStore;

use super::rate_limit::RateLimiter;
use super::reconstruct::ConversationReconstructor;
use super::store::SessionStore;

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Ready for a command.
    Idle,
    /// Rebuilding history from a stored handle.
    Reconstructing,
    /// A turn has been sent and its reply has not landed.
    AwaitingReply,
    /// The last submission was refused by the rate limiter.
    RateLimited,
    /// The last submission failed at the proxy.
    Failed,
}

impl SessionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reconstructing => "reconstructing",
            Self::AwaitingReply => "awaiting_reply",
            Self::RateLimited => "rate_limited",
            Self::Failed => "failed",
        }
    }

    /// Whether an operation is in flight. Submissions are refused while busy.
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Reconstructing | Self::AwaitingReply)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub status: SessionStatus,
    pub transcript: Transcript,
    pub pending_reply: Option<String>,
    pub error: Option<String>,
    /// Text the user has typed but not successfully sent.
    pub input: String,
    pub remaining_requests: u32,
    pub handle: Option<ConversationHandle>,
}

/// How a load settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No stored handle; nothing to rebuild.
    Empty,
    /// History was rebuilt from the stored handle.
    Restored,
    /// A reset happened while the lookups were in flight.
    Discarded,
}

/// How a submission settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assistant replied.
    Replied { reply: String },
    /// A reset happened while the turn was in flight.
    Discarded,
}

#[derive(Debug)]
struct State {
    status: SessionStatus,
    transcript: Transcript,
    pending_reply: Option<String>,
    error: Option<String>,
    input: String,
    handle: Option<ConversationHandle>,
    generation: u64,
}

impl State {
    const fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            transcript: Transcript::new(),
            pending_reply: None,
            error: None,
            input: String::new(),
            handle: None,
            generation: 0,
        }
    }
}

/// Orchestrates the store, the rate limiter and the proxy for one client.
pub struct SessionController {
    store: SessionStore,
    limiter: RateLimiter,
    proxy: Arc<dyn ResponsesProxy>,
    reconstructor: ConversationReconstructor,
    state: Mutex<State>,
}

impl SessionController {
    /// Controller persisting both the handle and the rate limit in `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, proxy: Arc<dyn ResponsesProxy>) -> Self {
        Self::with_limiter(
            SessionStore::new(store.clone()),
            RateLimiter::new(store),
            proxy,
        )
    }

    pub fn with_limiter(
        store: SessionStore,
        limiter: RateLimiter,
        proxy: Arc<dyn ResponsesProxy>,
    ) -> Self {
        Self {
            store,
            limiter,
            reconstructor: ConversationReconstructor::new(proxy.clone()),
            proxy,
            state: Mutex::new(State::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state for display.
    pub fn view(&self) -> SessionView {
        let state = self.lock();
        SessionView {
            status: state.status,
            transcript: state.transcript.clone(),
            pending_reply: state.pending_reply.clone(),
            error: state.error.clone(),
            input: state.input.clone(),
            remaining_requests: self.limiter.remaining_requests(),
            handle: state.handle.clone(),
        }
    }

    /// Restore the stored conversation, if any.
    pub async fn load(&self) -> Result<LoadOutcome, ChatError> {
        let generation = {
            let state = self.lock();
            if state.status.is_busy() {
                return Err(ChatError::Busy);
            }
            state.generation
        };

        let stored = self.store.get();

        let handle = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!("discarding stored handle read before a reset");
                return Ok(LoadOutcome::Discarded);
            }
            if state.status.is_busy() {
                return Err(ChatError::Busy);
            }

            let handle = match stored {
                Ok(handle) => handle,
                Err(e) => {
                    let err = ChatError::from(e);
                    warn!(error = %err, "could not read stored conversation");
                    state.error = Some(err.to_string());
                    return Err(err);
                }
            };

            state.handle.clone_from(&handle);
            let Some(handle) = handle else {
                state.status = SessionStatus::Idle;
                return Ok(LoadOutcome::Empty);
            };

            state.status = SessionStatus::Reconstructing;
            state.error = None;
            handle
        };

        info!(%handle, "restoring conversation");
        let result = self.reconstructor.reconstruct(&handle).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!(%handle, "discarding reconstruction that finished after a reset");
            return Ok(LoadOutcome::Discarded);
        }

        state.status = SessionStatus::Idle;
        match result {
            Ok(restored) => {
                state.transcript = restored.transcript;
                state.pending_reply = restored.pending_reply;
                Ok(LoadOutcome::Restored)
            }
            Err(err) => {
                warn!(%handle, error = %err, "could not restore conversation");
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Send `text` as the next user turn.
    ///
    /// Refused with [`ChatError::Busy`] while a reply or reconstruction is in
    /// flight; the view is left untouched. Invalid input consumes no quota.
    /// On failure the text stays in the input buffer so it can be resent.
    pub async fn submit(&self, text: &str) -> Result<TurnOutcome, ChatError> {
        let (request, generation) = {
            let mut state = self.lock();
            // The in-flight turn owns the buffer and the error slot.
            if state.status.is_busy() {
                return Err(ChatError::Busy);
            }
            state.input = text.to_string();

            if let Err(err) = validate(text) {
                state.error = Some(err.to_string());
                return Err(err);
            }
            state.status = SessionStatus::Idle;

            if !self.limiter.check_limit() {
                let remaining = self.limiter.remaining_requests();
                info!(remaining, "submission refused by rate limiter");
                let err = ChatError::RateLimited { remaining };
                state.status = SessionStatus::RateLimited;
                state.error = Some(err.to_string());
                return Err(err);
            }

            state.status = SessionStatus::AwaitingReply;
            state.error = None;
            let request = CreateTurnRequest {
                input: text.to_string(),
                previous_response_id: state.handle.clone(),
            };
            (request, state.generation)
        };

        let result = self.proxy.create_turn(&request).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!("discarding reply that arrived after a reset");
            return Ok(TurnOutcome::Discarded);
        }

        match result {
            Ok(reply) => {
                state.error = None;
                if let Some(handle) = reply.new_handle() {
                    if let Err(e) = self.store.set(&handle) {
                        warn!(error = %e, "could not persist conversation handle");
                        state.error = Some(ChatError::from(e).to_string());
                    }
                    state.handle = Some(handle);
                }

                if let Some(previous) = state.pending_reply.take() {
                    state.transcript.push(Role::Assistant, previous);
                }
                state.transcript.push(Role::User, request.input);
                state.pending_reply = Some(reply.response.clone());
                state.input.clear();
                state.status = SessionStatus::Idle;
                info!(handle = ?state.handle, "turn completed");

                Ok(TurnOutcome::Replied {
                    reply: reply.response,
                })
            }
            Err(e) => {
                let err = ChatError::from(e);
                warn!(error = %err, "turn failed");
                state.status = SessionStatus::Failed;
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Forget the conversation, regardless of what is in flight.
    ///
    /// The in-memory state is always cleared; the error only reports a
    /// failure to clear the stored handle.
    pub fn reset(&self) -> Result<(), ChatError> {
        let mut state = self.lock();
        state.generation += 1;
        state.status = SessionStatus::Idle;
        state.transcript.clear();
        state.pending_reply = None;
        state.error = None;
        state.input.clear();
        state.handle = None;

        if let Err(e) = self.store.clear() {
            let err = ChatError::from(e);
            warn!(error = %err, "could not clear stored conversation");
            state.error = Some(err.to_string());
            return Err(err);
        }
        info!("conversation reset");
        Ok(())
    }
}

fn validate(text: &str) -> Result<(), ChatError> {
    if text.trim().is_empty() {
        return Err(ChatError::Validation(messages::EMPTY_MESSAGE));
    }
    if text.chars().count() > MAX_INPUT_LENGTH {
        return Err(ChatError::Validation(messages::INVALID_INPUT));
    }
    Ok(())
}
