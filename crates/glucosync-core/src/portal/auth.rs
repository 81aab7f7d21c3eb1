//! Authenticator backed by a session stored in the OS keyring.
//!
//! The portal only issues sessions through its interactive login, so this
//! authenticator cannot mint one itself. It validates whatever the operator
//! installed (`glucosync auth set-token`) and reports expiry so the caller
//! can tell a lapsed session apart from a missing one.

use crate::portal::session::Session;
use crate::portal::session_store;
use crate::portal::traits::Authenticator;
use crate::sync::types::SyncError;

const SESSION_KEY: &str = "portal_session";

/// Reads the portal session from the OS keyring.
#[derive(Debug, Default)]
pub struct StoredSessionAuthenticator;

impl StoredSessionAuthenticator {
    pub fn new() -> Self {
        Self
    }

    /// Load the stored session without validating expiry.
    pub fn stored_session() -> Option<Session> {
        session_store::get(SESSION_KEY)
            .ok()
            .flatten()
            .and_then(|json| serde_json::from_str(&json).ok())
    }

    /// Install a session in the keyring.
    pub fn store_session(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string(session)?;
        session_store::set(SESSION_KEY, &json)
    }

    /// Remove the stored session.
    pub fn clear_session() -> Result<(), Box<dyn std::error::Error>> {
        session_store::delete(SESSION_KEY)
    }
}

impl Authenticator for StoredSessionAuthenticator {
    fn authenticate(&mut self, _force_new: bool) -> Result<Session, SyncError> {
        let session = Self::stored_session().ok_or_else(|| SyncError::Auth {
            status: 401,
            message: "no stored portal session; run `glucosync auth set-token` first".into(),
        })?;

        if session.is_expired() {
            // A fresh session needs another interactive login; surface it as
            // expiry so the caller's messaging points at re-authentication.
            return Err(SyncError::AuthExpired);
        }

        Ok(session)
    }
}
