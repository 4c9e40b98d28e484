//! Authentication collaborator.
//!
//! Identity is owned by an external provider; the ledger only needs the uid
//! of the signed-in user to pick which collection it works on.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No authenticated session")]
    NoSession,
}

/// Source of the currently authenticated user.
pub trait AuthProvider: Send + Sync {
    fn authenticated_user(&self) -> Result<AuthUser, AuthError>;
}

/// A provider whose session is fixed when it is built, e.g. from a CLI flag.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    uid: Option<String>,
}

impl StaticSession {
    pub fn signed_in(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn from_option(uid: Option<String>) -> Self {
        Self {
            uid: uid.filter(|u| !u.trim().is_empty()),
        }
    }
}

impl AuthProvider for StaticSession {
    fn authenticated_user(&self) -> Result<AuthUser, AuthError> {
        self.uid
            .clone()
            .map(|uid| AuthUser { uid })
            .ok_or(AuthError::NoSession)
    }
}
