//! Authenticated identity and owner scope.
//!
//! Credential validity is decided by the remote store; this module only
//! holds what the user signed in with and broadcasts changes so sync loops
//! can restart for the new owner.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Credential presented to the remote store
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: None,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}

/// Whose tree is being read or written
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerScope {
    /// Signed in; keyed by user id, or by token when the id is unknown
    User(String),
    /// Local-only playground
    Anonymous,
}

impl OwnerScope {
    pub fn of(session: Option<&Session>) -> Self {
        match session {
            Some(s) => OwnerScope::User(s.user_id.clone().unwrap_or_else(|| s.token.clone())),
            None => OwnerScope::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, OwnerScope::User(_))
    }
}

/// Holds the current session and notifies subscribers when it changes
pub struct SessionProvider {
    tx: watch::Sender<Option<Session>>,
}

impl SessionProvider {
    pub fn new(initial: Option<Session>) -> Arc<Self> {
        let (tx, _rx) = watch::channel(initial);
        Arc::new(Self { tx })
    }

    pub fn anonymous() -> Arc<Self> {
        Self::new(None)
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn scope(&self) -> OwnerScope {
        OwnerScope::of(self.tx.borrow().as_ref())
    }

    pub fn sign_in(&self, session: Session) {
        info!(email = ?session.email, "signed in");
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            info!("signed out");
        }
    }

    /// Drop a credential the remote store rejected.
    ///
    /// Only clears the session if it is still the one that was rejected, so a
    /// late 401 cannot sign out a newer login.
    pub fn invalidate(&self, rejected: &Session) {
        let cleared = self.tx.send_if_modified(|current| {
            if current.as_ref().map(|s| s.token == rejected.token).unwrap_or(false) {
                *current = None;
                true
            } else {
                false
            }
        });
        if cleared {
            warn!("session rejected by remote store; continuing with local storage");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}
