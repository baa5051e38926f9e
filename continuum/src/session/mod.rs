//! Session continuity core: rate limiting, handle persistence,
//! history reconstruction and the controller tying them together.

mod controller;
mod rate_limit;
mod reconstruct;
mod store;

#[cfg(test)]
mod test_support;

pub use controller::{LoadOutcome, SessionController, SessionStatus, SessionView, TurnOutcome};
pub use rate_limit::{
    Clock, ManualClock, RateLimitPolicy, RateLimitRecord, RateLimiter, SystemClock,
};
pub use reconstruct::{merge_history, ConversationReconstructor, Reconstruction};
pub use store::SessionStore;
