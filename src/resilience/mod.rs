//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to provider:
//!     → timeouts.rs (enforce per-call deadline)
//!     → On failure: error returned to the route, mapped to a generic status
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: a failed provider call fails the request immediately

pub mod timeouts;

pub use timeouts::{with_deadline, TimeoutProvider};
