//! Configuration and shared constants.
//!
//! Everything tunable lives here; the CLI builds [`ClientConfig`] and
//! [`ServerConfig`] from its arguments (which fall back to env vars).

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Storage key holding the current conversation handle.
pub const PREVIOUS_RESPONSE_KEY: &str = "previous_response_id";
/// Storage key holding the rate limiter record.
pub const RATE_LIMIT_KEY: &str = "rate_limit_data";

/// Requests admitted per window.
pub const MAX_REQUESTS: u32 = 100;
/// Rate limit window (60 minutes).
pub const WINDOW_MS: i64 = 60 * 60 * 1000;

/// Longest message accepted from the user.
pub const MAX_INPUT_LENGTH: usize = 2000;

/// Default model requested from the completion service.
pub const DEFAULT_MODEL: &str = "gpt-4.1";
/// Default proxy port.
pub const DEFAULT_PORT: u16 = 58231;
/// Default upstream Responses API base URL.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1";
/// Default instructions when no instructions file is configured.
pub const DEFAULT_INSTRUCTIONS: &str =
    "You are a friendly, concise assistant. Answer in plain text.";

/// Directory under the home directory used when no data dir is given.
const DATA_DIR: &str = ".continuum";

/// User-facing messages.
pub mod messages {
    pub const EMPTY_MESSAGE: &str = "Please enter a message";
    pub const INVALID_INPUT: &str = "Please enter a valid message";
    pub const RATE_LIMIT_EXCEEDED: &str = "Rate limit exceeded. Please try again later.";
    pub const API_CALL_FAILED: &str = "API call failed";
    pub const NETWORK_ERROR: &str = "Network error. Please check your connection.";
    pub const BUSY: &str = "Please wait for the current reply to finish.";
    pub const SERVICE_UNAVAILABLE: &str = "Chat service temporarily unavailable";
}

/// Settings for the chat client side.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the proxy server, e.g. `http://127.0.0.1:58231`.
    pub proxy_url: String,
    /// Directory holding persisted session state.
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Build a client config, defaulting the data dir to `~/.continuum`.
    pub fn new(proxy_url: String, data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        Ok(Self {
            proxy_url: proxy_url.trim_end_matches('/').to_string(),
            data_dir,
        })
    }
}

/// Settings for the proxy server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on (loopback only).
    pub port: u16,
    /// Base URL of the upstream Responses API.
    pub upstream_url: String,
    /// Bearer key for the upstream. Requests fail with 500 while unset.
    pub api_key: Option<String>,
    /// Model name sent upstream.
    pub model: String,
    /// Instructions sent upstream with every new turn.
    pub instructions: String,
}

impl ServerConfig {
    /// Build a server config, reading instructions from `instructions_file` if given.
    pub fn new(
        port: u16,
        upstream_url: String,
        api_key: Option<String>,
        model: String,
        instructions_file: Option<PathBuf>,
    ) -> Result<Self> {
        let instructions = match instructions_file {
            Some(path) => std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read instructions from {}", path.display()))?,
            None => DEFAULT_INSTRUCTIONS.to_string(),
        };

        Ok(Self {
            port,
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            instructions,
        })
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(DATA_DIR))
}
