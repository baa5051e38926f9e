//! Continuum - a chat session that survives restarts.
//!
//! A client keeps one conversation alive across launches by storing only the
//! handle of the latest reply. On start the history behind that handle is
//! rebuilt from the proxy; every turn is checked against a local rolling
//! rate limit before it is sent.
//!
//! Architecture:
//! - `session` holds the client core (controller, rate limiter, store, reconstructor)
//! - `proxy` is the client side of the HTTP boundary, `server` the other side
//! - `storage` persists small string values (files on disk, memory in tests)

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod server;
pub mod session;
pub mod storage;
