//! HTTP client for the proxy server.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{
    ConversationHandle, CreateTurnRequest, CreateTurnResponse, ErrorBody, InputItemsBody,
    PreviousResponseBody, ResponseItem,
};

use super::{ProxyError, ResponsesProxy};

/// Route prefix shared by all proxy operations.
const RESPONSES_PATH: &str = "/api/openai/responses";

/// Talks to the proxy over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProxy {
    base_url: String,
    http: reqwest::Client,
}

impl HttpProxy {
    /// Create a client for the proxy at `base_url` (e.g. `http://127.0.0.1:58231`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client reusing an existing connection pool.
    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    fn responses_url(&self) -> String {
        format!("{}{RESPONSES_PATH}", self.base_url)
    }

    fn response_url(&self, handle: &ConversationHandle) -> String {
        format!(
            "{}/{}",
            self.responses_url(),
            urlencoding::encode(handle.as_str())
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProxyError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ProxyError::Transport(e.to_string()))?;
        decode(resp).await
    }
}

/// Turn a proxy response into `T`, or into the error its body describes.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ProxyError> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.json::<ErrorBody>().await.ok().and_then(|b| b.error);
        warn!(status = status.as_u16(), ?message, "proxy call failed");
        return Err(ProxyError::Status {
            status: status.as_u16(),
            message,
        });
    }

    resp.json::<T>()
        .await
        .map_err(|e| ProxyError::Transport(format!("Failed to parse response: {e}")))
}

#[async_trait]
impl ResponsesProxy for HttpProxy {
    async fn create_turn(
        &self,
        request: &CreateTurnRequest,
    ) -> Result<CreateTurnResponse, ProxyError> {
        debug!(
            continuing = request.previous_response_id.is_some(),
            "sending turn"
        );
        let resp = self
            .http
            .post(self.responses_url())
            .json(request)
            .send()
            .await
            .map_err(|e| ProxyError::Transport(e.to_string()))?;
        decode(resp).await
    }

    async fn fetch_previous_response(
        &self,
        handle: &ConversationHandle,
    ) -> Result<Vec<ResponseItem>, ProxyError> {
        let body: PreviousResponseBody = self.get_json(&self.response_url(handle)).await?;
        debug!(%handle, outputs = body.output.len(), "fetched previous response");
        Ok(body.output)
    }

    async fn list_input_items(
        &self,
        handle: &ConversationHandle,
    ) -> Result<Vec<ResponseItem>, ProxyError> {
        let url = format!("{}/input_items", self.response_url(handle));
        let body: InputItemsBody = self.get_json(&url).await?;
        debug!(%handle, items = body.data.len(), "listed input items");
        Ok(body.data)
    }
}
