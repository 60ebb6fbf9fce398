//! Shared harness for integration tests
//!
//! - [`ScriptedTransport`] answers from a queue and records every request
//! - [`GatedTransport`] hands each request to the test, which answers it
//!   whenever (and in whatever order) it likes

#![allow(dead_code)]

use async_trait::async_trait;
use ipms::client::{ApiRequest, ApiResponse, Transport};
use ipms::config::{ClientConfig, RefreshPolicy};
use ipms::core::{ClientError, ClientResult};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

/// Default configuration with the given refresh policy
pub fn config(refresh: RefreshPolicy) -> ClientConfig {
    let mut config = ClientConfig::default_config();
    config.store.refresh = refresh;
    config
}

/// A 200 list response carrying `x-total-count`
pub fn list_response(items: Value, total: u64) -> ApiResponse {
    ApiResponse::new(200)
        .with_header("x-total-count", total.to_string())
        .with_body(items)
}

pub fn json_response(status: u16, body: Value) -> ApiResponse {
    ApiResponse::new(status).with_body(body)
}

pub fn problem(status: u16, detail: &str) -> ApiResponse {
    json_response(status, json!({"status": status, "detail": detail}))
}

// =============================================================================
// Scripted transport
// =============================================================================

/// Transport answering from a queue of canned responses
///
/// Requests arriving after the queue is drained get an empty list page.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ClientResult<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: ApiResponse) -> &Self {
        self.script.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn push_error(&self, error: ClientError) -> &Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Every request sent so far, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(list_response(json!([]), 0)))
    }
}

// =============================================================================
// Gated transport
// =============================================================================

/// A request waiting for the test to answer it
pub struct Pending {
    pub request: ApiRequest,
    reply: oneshot::Sender<ClientResult<ApiResponse>>,
}

impl Pending {
    pub fn respond(self, response: ApiResponse) {
        let _ = self.reply.send(Ok(response));
    }

    pub fn fail(self, error: ClientError) {
        let _ = self.reply.send(Err(error));
    }
}

/// Transport that parks every request until the test responds
pub struct GatedTransport {
    pending: mpsc::UnboundedSender<Pending>,
}

impl GatedTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Pending>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { pending: tx }, rx)
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let (reply, answer) = oneshot::channel();
        self.pending
            .send(Pending { request, reply })
            .map_err(|_| ClientError::Transport {
                message: "test harness dropped".to_string(),
            })?;
        answer.await.map_err(|_| ClientError::Transport {
            message: "request abandoned".to_string(),
        })?
    }
}
