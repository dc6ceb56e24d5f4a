//! Session identity injected into components that act on behalf of a user.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// The signed-in user, as issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    user_id: String,
    #[serde(default)]
    role: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

/// Shared handle to the current session.
///
/// Clones observe the same sign-in state, so the auth layer and every
/// component holding a clone agree on who the current user is.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionContext {
    /// A context with nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context already signed in as `session`.
    pub fn signed_in(session: Session) -> Self {
        Self {
            current: Arc::new(RwLock::new(Some(session))),
        }
    }

    pub fn sign_in(&self, session: Session) {
        *self.write() = Some(session);
    }

    /// Sign out, returning the session that was active.
    pub fn sign_out(&self) -> Option<Session> {
        self.write().take()
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.read().as_ref().map(|session| session.user_id.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.read().is_some()
    }

    // A poisoned session lock still holds a valid Option; keep using it.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
