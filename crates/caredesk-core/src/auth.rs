//! Authentication boundary.
//!
//! Session issuance and credential checks live outside this crate. The
//! accessors only need to know who is signed in, so they receive an
//! [`Authenticator`] by injection.

use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Identity of an authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The auth collaborator as seen by the accessors.
pub trait Authenticator: Send + Sync {
    /// Currently signed-in principal, if any.
    fn current_principal(&self) -> Option<PrincipalId>;

    /// End the current session. Signing out twice is harmless.
    fn sign_out(&self);
}

/// In-process session holder.
#[derive(Debug, Default)]
pub struct SessionAuth {
    principal: RwLock<Option<PrincipalId>>,
}

impl SessionAuth {
    /// No one signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session already established for `principal`.
    pub fn signed_in(principal: impl Into<PrincipalId>) -> Self {
        Self {
            principal: RwLock::new(Some(principal.into())),
        }
    }

    pub fn sign_in(&self, principal: impl Into<PrincipalId>) {
        let mut slot = self.principal.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(principal.into());
    }
}

impl Authenticator for SessionAuth {
    fn current_principal(&self) -> Option<PrincipalId> {
        self.principal
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn sign_out(&self) {
        let mut slot = self.principal.write().unwrap_or_else(|e| e.into_inner());
        if let Some(principal) = slot.take() {
            tracing::info!(%principal, "signed out");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_has_no_principal() {
        assert_eq!(SessionAuth::anonymous().current_principal(), None);
    }

    #[test]
    fn test_sign_in_and_out() {
        let auth = SessionAuth::anonymous();
        auth.sign_in("user-1");
        assert_eq!(auth.current_principal(), Some(PrincipalId::new("user-1")));

        auth.sign_out();
        assert_eq!(auth.current_principal(), None);

        // Second sign-out is a no-op
        auth.sign_out();
        assert_eq!(auth.current_principal(), None);
    }
}
