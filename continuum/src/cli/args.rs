//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

use crate::config::{DEFAULT_MODEL, DEFAULT_PORT, DEFAULT_UPSTREAM_URL};

/// Continuum - a chat session that survives restarts
#[derive(Parser, Debug)]
#[command(name = "continuum")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the chat proxy
    #[arg(
        long,
        global = true,
        env = "CONTINUUM_PROXY_URL",
        default_value = "http://127.0.0.1:58231"
    )]
    pub proxy_url: String,

    /// Directory holding the stored conversation and rate limit record
    #[arg(long, global = true, env = "CONTINUUM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log verbosity (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Subcommand to execute (defaults to `chat`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat; restores the stored conversation first
    Chat,

    /// Send one message and print the reply
    Send {
        /// Message to send
        #[arg(trailing_var_arg = true, required = true)]
        message: Vec<String>,
    },

    /// Print the stored conversation
    History,

    /// Forget the stored conversation
    Reset,

    /// Show how many requests remain in the current window
    Quota,

    /// Run the proxy server in front of the completion service
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Base URL of the upstream Responses API
        #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_UPSTREAM_URL)]
        upstream_url: String,

        /// API key for the upstream
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Model to request
        #[arg(short, long, default_value = DEFAULT_MODEL)]
        model: String,

        /// File with instructions sent along with every turn
        #[arg(long)]
        instructions_file: Option<PathBuf>,
    },
}

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
