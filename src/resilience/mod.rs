//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (hard deadline over the whole exchange)
//!     → on expiry: future dropped, caller sees DeadlineExceeded → 504
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No automatic retries; retry policy belongs to the client

pub mod timeouts;

pub use timeouts::{with_deadline, DeadlineExceeded};
