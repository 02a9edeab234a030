//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap provider calls with a deadline
//! - Record call latency and outcome
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Implemented as a decorator so handlers never see raw provider latency

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::timeout;

use crate::observability::metrics;
use crate::provider::{Credentials, ProviderError, ProviderResult, RaceDataProvider, SubsessionId};

/// Run `fut` with a deadline, mapping expiry to [`ProviderError::Timeout`].
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(deadline.as_secs())),
    }
}

/// Provider decorator that bounds every call.
pub struct TimeoutProvider {
    inner: Arc<dyn RaceDataProvider>,
    deadline: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn RaceDataProvider>, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    async fn guarded<T, F>(&self, operation: &'static str, fut: F) -> ProviderResult<T>
    where
        F: Future<Output = ProviderResult<T>>,
    {
        let start = Instant::now();
        let result = with_deadline(self.deadline, fut).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::record_provider_call(operation, outcome, start);

        if let Err(ProviderError::Timeout(secs)) = &result {
            tracing::warn!(operation, deadline_secs = *secs, "Provider call timed out");
        }
        result
    }
}

#[async_trait]
impl RaceDataProvider for TimeoutProvider {
    async fn authenticate(&self, credentials: &Credentials) -> ProviderResult<()> {
        self.guarded("authenticate", self.inner.authenticate(credentials))
            .await
    }

    async fn recent_races(&self) -> ProviderResult<Value> {
        self.guarded("recent_races", self.inner.recent_races()).await
    }

    async fn race_result(&self, subsession_id: SubsessionId) -> ProviderResult<Value> {
        self.guarded("race_result", self.inner.race_result(subsession_id))
            .await
    }
}
