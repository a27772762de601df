//! Authentication seam
//!
//! The journal core never talks to an identity provider itself; it only
//! needs a stable, non-anonymous user id to scope store access. The
//! embedding application supplies one through [`AuthProvider`].

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Identity of the currently signed-in user, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    /// Anonymous/guest sessions can browse the landing page but never
    /// touch the journal collection.
    pub anonymous: bool,
}

/// Source of the current session identity.
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<UserIdentity>;
}

/// Resolve the owner id for store access, rejecting signed-out and
/// anonymous sessions. Callers surface [`AppError::Unauthenticated`] as a
/// redirect to sign-in.
pub fn require_owner(auth: &dyn AuthProvider) -> Result<String> {
    match auth.current_user() {
        Some(user) if !user.anonymous => Ok(user.user_id),
        _ => Err(AppError::Unauthenticated),
    }
}

/// Fixed identity provider for tests and single-user local setups.
#[derive(Debug, Clone, Default)]
pub struct FixedAuth {
    identity: Option<UserIdentity>,
}

impl FixedAuth {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            identity: Some(UserIdentity {
                user_id: user_id.into(),
                anonymous: false,
            }),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            identity: Some(UserIdentity {
                user_id: "anonymous".to_string(),
                anonymous: true,
            }),
        }
    }

    pub fn signed_out() -> Self {
        Self { identity: None }
    }
}

impl AuthProvider for FixedAuth {
    fn current_user(&self) -> Option<UserIdentity> {
        self.identity.clone()
    }
}
