//! Forwarding client for the upstream Responses API.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::{messages, ServerConfig};
use crate::models::ConversationHandle;

/// Failure of an upstream call, already shaped for the proxy's clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    pub status: u16,
    pub message: String,
}

impl UpstreamError {
    fn unavailable() -> Self {
        Self {
            status: 500,
            message: messages::SERVICE_UNAVAILABLE.to_string(),
        }
    }

    fn transport(err: &reqwest::Error) -> Self {
        Self {
            status: 500,
            message: err.to_string(),
        }
    }
}

/// Thin reqwest wrapper over `POST /responses`, `GET /responses/{id}` and
/// `GET /responses/{id}/input_items`.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    instructions: String,
}

impl UpstreamClient {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.upstream_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            instructions: config.instructions.clone(),
        }
    }

    fn api_key(&self) -> Result<&str, UpstreamError> {
        self.api_key.as_deref().ok_or_else(|| {
            warn!("upstream API key not configured");
            UpstreamError::unavailable()
        })
    }

    fn response_url(&self, id: &str) -> String {
        format!("{}/responses/{}", self.base_url, urlencoding::encode(id))
    }

    /// Create a response continuing `previous` (if any).
    pub async fn create_response(
        &self,
        input: &str,
        previous: Option<&ConversationHandle>,
    ) -> Result<Value, UpstreamError> {
        let key = self.api_key()?;
        let body = json!({
            "model": self.model,
            "instructions": self.instructions,
            "input": input,
            "previous_response_id": previous.map(ConversationHandle::as_str),
        });

        let request = self
            .http
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(key)
            .json(&body);
        send(request).await
    }

    pub async fn get_response(&self, id: &str) -> Result<Value, UpstreamError> {
        let key = self.api_key()?;
        send(self.http.get(self.response_url(id)).bearer_auth(key)).await
    }

    pub async fn list_input_items(&self, id: &str) -> Result<Value, UpstreamError> {
        let key = self.api_key()?;
        let url = format!("{}/input_items", self.response_url(id));
        send(self.http.get(url).bearer_auth(key)).await
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<Value, UpstreamError> {
    let resp = request
        .send()
        .await
        .map_err(|e| UpstreamError::transport(&e))?;
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let message = error_message(&body).unwrap_or_else(|| messages::API_CALL_FAILED.to_string());
        warn!(status = status.as_u16(), %message, "upstream call failed");
        return Err(UpstreamError {
            status: status.as_u16(),
            message,
        });
    }

    debug!(status = status.as_u16(), "upstream call succeeded");
    Ok(body)
}

/// Pull a message out of `{"error": {"message": ..}}` or `{"error": ".."}`.
fn error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(String::from)
}

/// Concatenate the `output_text` blocks of a response's message items.
pub fn output_text(response: &Value) -> String {
    let Some(output) = response.get("output").and_then(Value::as_array) else {
        return String::new();
    };

    output
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("message"))
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect()
}
