//! Session storage.
//!
//! # Responsibilities
//! - Define the storage contract (`get`, `set`, `touch`, `expire`)
//! - Provide a process-local implementation with idle expiry
//! - Purge expired records in the background
//!
//! # Design Decisions
//! - Async trait so a networked store can replace the map without touching routes
//! - Expired records read as absent even before the reaper removes them
//! - Deadlines use Tokio's clock so tests can drive time

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::observability::metrics;
use crate::session::{SessionError, SessionId, SessionRecord};

/// Backing storage for sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a live record. Expired or unknown ids yield `None`.
    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError>;

    /// Insert or replace a record and restart its idle lifetime.
    async fn set(&self, id: &SessionId, record: SessionRecord) -> Result<(), SessionError>;

    /// Restart the idle lifetime of an existing record.
    async fn touch(&self, id: &SessionId) -> Result<(), SessionError>;

    /// Remove a record.
    async fn expire(&self, id: &SessionId) -> Result<(), SessionError>;
}

#[derive(Debug)]
struct Entry {
    record: SessionRecord,
    expires_at: Instant,
}

/// In-memory session store with idle expiry.
#[derive(Debug)]
pub struct MemorySessionStore {
    entries: DashMap<SessionId, Entry>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Number of records held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired record. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    fn deadline_from(&self, now: Instant) -> Result<Instant, SessionError> {
        now.checked_add(self.ttl)
            .ok_or_else(|| SessionError::Store(format!("session ttl {:?} overflows the clock", self.ttl)))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError> {
        let now = Instant::now();
        // The map guard must be released before removing from the same shard.
        let lookup = self
            .entries
            .get(id)
            .map(|entry| (entry.expires_at > now).then(|| entry.record.clone()));

        match lookup {
            Some(Some(record)) => Ok(Some(record)),
            Some(None) => {
                self.entries.remove_if(id, |_, entry| entry.expires_at <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, id: &SessionId, record: SessionRecord) -> Result<(), SessionError> {
        let expires_at = self.deadline_from(Instant::now())?;
        self.entries.insert(id.clone(), Entry { record, expires_at });
        Ok(())
    }

    async fn touch(&self, id: &SessionId) -> Result<(), SessionError> {
        let now = Instant::now();
        let deadline = self.deadline_from(now)?;
        if let Some(mut entry) = self.entries.get_mut(id) {
            if entry.expires_at > now {
                entry.expires_at = deadline;
            }
        }
        Ok(())
    }

    async fn expire(&self, id: &SessionId) -> Result<(), SessionError> {
        self.entries.remove(id);
        Ok(())
    }
}

/// Periodically purge expired sessions until shutdown is signalled.
pub fn spawn_reaper(
    store: Arc<MemorySessionStore>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = store.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, remaining = store.len(), "Purged expired sessions");
                    }
                    metrics::record_active_sessions(store.len());
                }
                _ = shutdown.recv() => {
                    tracing::info!("Session reaper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    })
}
