//! Server-side session subsystem.
//!
//! # Data Flow
//! ```text
//! Request with Cookie header
//!     → cookie.rs (verify HMAC signature, extract SessionId)
//!     → store.rs (look up SessionRecord; expired = absent)
//!     → layer.rs (attach Session handle to request extensions)
//!     → handler reads/marks the Session
//!     → layer.rs (persist + Set-Cookie, touch, or expire + clear)
//! ```
//!
//! # Design Decisions
//! - Anonymous sessions are never stored and never get a cookie
//! - A session is only written back when a handler changed it
//! - The store is a trait; the in-memory map is one implementation

pub mod cookie;
pub mod layer;
pub mod store;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use thiserror::Error;

pub use cookie::{CookiePolicy, CookieSigner, SameSite};
pub use layer::{session_middleware, SessionManager};
pub use store::{spawn_reaper, MemorySessionStore, SessionStore};

/// Opaque session identifier: 32 random bytes, URL-safe base64.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_verified(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

// Session ids are bearer tokens; keep them out of logs.
impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionId({prefix}…)")
    }
}

/// Authentication state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated,
}

/// What the store keeps for each session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub state: SessionState,
    /// Creation time, seconds since the Unix epoch.
    pub created_at: u64,
}

impl SessionRecord {
    pub fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }
}

/// Errors from the session subsystem.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Backing store failed.
    #[error("session store unavailable: {0}")]
    Store(String),

    /// Cookie could not be built or signed.
    #[error("session cookie error: {0}")]
    Cookie(String),

    /// A handler asked for a session but the session layer is not installed.
    #[error("session layer not installed")]
    MissingLayer,
}

/// Pending write-back for a session after the handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Change {
    None,
    Modified,
    Destroyed,
}

#[derive(Debug)]
struct SessionInner {
    id: SessionId,
    record: SessionRecord,
    stored: bool,
    change: Change,
}

/// Per-request handle to the current session.
///
/// Cloned into request extensions; the session layer reads it back after
/// the handler returns.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
}

impl Session {
    pub(crate) fn existing(id: SessionId, record: SessionRecord) -> Self {
        Self::build(id, record, true)
    }

    pub(crate) fn fresh() -> Self {
        Self::build(SessionId::generate(), SessionRecord::anonymous(), false)
    }

    fn build(id: SessionId, record: SessionRecord, stored: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                id,
                record,
                stored,
                change: Change::None,
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SessionInner) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    pub fn id(&self) -> SessionId {
        self.with(|s| s.id.clone())
    }

    pub fn state(&self) -> SessionState {
        self.with(|s| s.record.state)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Whether the session came from the store (a valid cookie was presented).
    pub fn is_stored(&self) -> bool {
        self.with(|s| s.stored)
    }

    /// Transition `Anonymous → Authenticated`; persisted after the handler.
    pub fn mark_authenticated(&self) {
        self.with(|s| {
            s.record.state = SessionState::Authenticated;
            s.change = Change::Modified;
        });
    }

    /// Drop the session from the store and clear the cookie.
    pub fn destroy(&self) {
        self.with(|s| {
            s.record.state = SessionState::Anonymous;
            s.change = Change::Destroyed;
        });
    }

    pub(crate) fn snapshot(&self) -> (SessionId, SessionRecord, bool, Change) {
        self.with(|s| (s.id.clone(), s.record.clone(), s.stored, s.change))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_url_safe() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 43);
        assert!(a
            .as_str()
            .bytes()
            .all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_'));
    }

    #[test]
    fn test_debug_hides_full_id() {
        let id = SessionId::generate();
        assert!(!format!("{id:?}").contains(id.as_str()));
    }

    #[test]
    fn test_session_transitions() {
        let session = Session::fresh();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(!session.is_stored());
        assert_eq!(session.snapshot().3, Change::None);

        session.mark_authenticated();
        assert!(session.is_authenticated());
        assert_eq!(session.snapshot().3, Change::Modified);

        session.destroy();
        assert!(!session.is_authenticated());
        assert_eq!(session.snapshot().3, Change::Destroyed);
    }

    #[test]
    fn test_clones_share_state() {
        let session = Session::fresh();
        let handle = session.clone();
        handle.mark_authenticated();
        assert!(session.is_authenticated());
    }
}
