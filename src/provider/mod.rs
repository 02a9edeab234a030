//! Racing-data provider subsystem.
//!
//! # Data Flow
//! ```text
//! route handler
//!     → RaceDataProvider (trait object, shared via Arc)
//!     → resilience::timeouts::TimeoutProvider (per-call deadline)
//!     → client.rs (HTTPS to the provider's members data API)
//! ```
//!
//! # Security Constraints
//! - Credentials are forwarded once and never stored or logged
//! - Provider error text stays server-side
//! - Payloads are opaque JSON and passed through unchanged

pub mod client;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use client::HttpProviderClient;
pub use types::{Credentials, InvalidSubsessionId, ProviderError, ProviderResult, SubsessionId};

/// Capability offered by the external racing-data provider.
#[async_trait]
pub trait RaceDataProvider: Send + Sync {
    /// Log in to the provider with the given credentials.
    async fn authenticate(&self, credentials: &Credentials) -> ProviderResult<()>;

    /// Recent races of the logged-in member.
    async fn recent_races(&self) -> ProviderResult<Value>;

    /// Full result document for one subsession.
    async fn race_result(&self, subsession_id: SubsessionId) -> ProviderResult<Value>;
}
