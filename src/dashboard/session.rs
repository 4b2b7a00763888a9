//! Keeps each signed-in session's dashboard state between requests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use sha2::{Digest, Sha256};
use time::{Date, Duration, OffsetDateTime};

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, dashboard::state::DashboardState};

/// Sessions not used for this long are dropped. The auth cookie is extended on
/// every request, so an idle session outliving it can never be used again.
pub const SESSION_IDLE_TIMEOUT: Duration = DEFAULT_COOKIE_DURATION;

/// Identifies a session without keeping the bearer token itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    /// Derive the key for the session that uses `token`.
    pub fn from_token(token: &str) -> Self {
        let digest = Sha256::digest(token.as_bytes());
        let hex = digest.iter().map(|byte| format!("{byte:02x}")).collect();

        Self(hex)
    }
}

#[derive(Debug)]
struct Session {
    state: DashboardState,
    last_access: OffsetDateTime,
}

type Sessions = HashMap<SessionKey, Session>;

/// The dashboard state of every active session.
///
/// The lock must not be held across an `.await`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<Sessions>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(SESSION_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that drops sessions unused for longer than `idle_timeout`.
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_timeout,
        }
    }

    /// Run `f` against the session's state, creating a fresh state showing the
    /// month of `today` if the session has none yet.
    ///
    /// Sessions that have been idle for too long are dropped first.
    ///
    /// # Errors
    /// Returns [Error::SessionLockError] if the lock is poisoned.
    pub fn with_session<T>(
        &self,
        key: &SessionKey,
        today: Date,
        f: impl FnOnce(&mut DashboardState) -> T,
    ) -> Result<T, Error> {
        self.with_session_at(key, today, OffsetDateTime::now_utc(), f)
    }

    fn with_session_at<T>(
        &self,
        key: &SessionKey,
        today: Date,
        now: OffsetDateTime,
        f: impl FnOnce(&mut DashboardState) -> T,
    ) -> Result<T, Error> {
        let mut sessions = self.lock()?;
        self.evict_idle(&mut sessions, now);

        let session = sessions.entry(key.clone()).or_insert_with(|| {
            tracing::debug!("Creating dashboard state for a new session");
            Session {
                state: DashboardState::new(today),
                last_access: now,
            }
        });
        session.last_access = now;

        Ok(f(&mut session.state))
    }

    fn evict_idle(&self, sessions: &mut Sessions, now: OffsetDateTime) {
        let before = sessions.len();
        sessions.retain(|_, session| now - session.last_access <= self.idle_timeout);

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!("Dropped {evicted} idle dashboard session(s)");
        }
    }

    /// Forget the session's state.
    ///
    /// # Errors
    /// Returns [Error::SessionLockError] if the lock is poisoned.
    pub fn remove(&self, key: &SessionKey) -> Result<(), Error> {
        self.lock()?.remove(key);

        Ok(())
    }

    /// The number of sessions with stored state.
    #[cfg(test)]
    pub fn session_count(&self) -> Result<usize, Error> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Sessions>, Error> {
        self.sessions.lock().map_err(|error| {
            tracing::error!("Could not acquire session lock: {error}");
            Error::SessionLockError
        })
    }
}
