//! In-process proxy double for session tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::models::{ConversationHandle, CreateTurnRequest, CreateTurnResponse, ResponseItem};
use crate::proxy::{ProxyError, ResponsesProxy};

/// Scripted [`ResponsesProxy`]. Turn results are consumed in order; lookup
/// results are returned on every call. With a gate set, each call waits for
/// one permit before answering.
#[derive(Default)]
pub struct FakeProxy {
    turns: Mutex<VecDeque<Result<CreateTurnResponse, ProxyError>>>,
    outputs: Mutex<Option<Result<Vec<ResponseItem>, ProxyError>>>,
    input_items: Mutex<Option<Result<Vec<ResponseItem>, ProxyError>>>,
    requests: Mutex<Vec<CreateTurnRequest>>,
    lookups: AtomicUsize,
    entered: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl FakeProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_turn(self, result: Result<CreateTurnResponse, ProxyError>) -> Self {
        self.turns.lock().unwrap().push_back(result);
        self
    }

    pub fn with_reply(self, response: &str, response_id: &str) -> Self {
        self.with_turn(Ok(CreateTurnResponse {
            response: response.to_string(),
            response_id: Some(response_id.to_string()),
        }))
    }

    pub fn with_outputs(self, result: Result<Vec<ResponseItem>, ProxyError>) -> Self {
        *self.outputs.lock().unwrap() = Some(result);
        self
    }

    pub fn with_input_items(self, result: Result<Vec<ResponseItem>, ProxyError>) -> Self {
        *self.input_items.lock().unwrap() = Some(result);
        self
    }

    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Create-turn requests received so far.
    pub fn requests(&self) -> Vec<CreateTurnRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of lookup calls (either kind) received so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of calls of any kind that have started.
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) {
        self.entered.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }

    fn lookup(
        slot: &Mutex<Option<Result<Vec<ResponseItem>, ProxyError>>>,
    ) -> Result<Vec<ResponseItem>, ProxyError> {
        slot.lock().unwrap().clone().unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl ResponsesProxy for FakeProxy {
    async fn create_turn(
        &self,
        request: &CreateTurnRequest,
    ) -> Result<CreateTurnResponse, ProxyError> {
        self.requests.lock().unwrap().push(request.clone());
        self.pass_gate().await;
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProxyError::Transport("no scripted turn".to_string())))
    }

    async fn fetch_previous_response(
        &self,
        _handle: &ConversationHandle,
    ) -> Result<Vec<ResponseItem>, ProxyError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        Self::lookup(&self.outputs)
    }

    async fn list_input_items(
        &self,
        _handle: &ConversationHandle,
    ) -> Result<Vec<ResponseItem>, ProxyError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        Self::lookup(&self.input_items)
    }
}

/// Yield until `proxy` has seen `calls` calls start.
pub async fn wait_for_calls(proxy: &FakeProxy, calls: usize) {
    while proxy.entered() < calls {
        tokio::task::yield_now().await;
    }
}
