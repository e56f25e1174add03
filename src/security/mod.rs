//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Validated request:
//!     → session.rs (client session id or anon_xxxxxxx)
//!     → rate_limit.rs (one request per session per window, chat quota)
//!     → Pass to upstream guard
//! ```
//!
//! # Design Decisions
//! - Checks run after body validation so malformed input costs no counter
//! - Fail open: a broken counter store never blocks traffic

pub mod rate_limit;
pub mod session;

pub use rate_limit::{Decision, MessageQuota, QuotaDecision, RateLimiter};
pub use session::SessionId;
