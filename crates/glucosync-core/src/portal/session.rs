//! Portal session handle.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Expiry buffer so a session is refreshed shortly before the portal would
/// reject it mid-fetch.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// An authenticated portal session: who we are and the credential header the
/// portal expects on every request. Passed explicitly into each cycle rather
/// than held as hidden instance state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Portal identity (account/user id) the session belongs to.
    pub identity: String,
    /// Value of the authorization header for API calls.
    pub credential_header: String,
    /// Expiry as a Unix timestamp; `None` means the portal gave no expiry.
    pub expires_at: Option<i64>,
}

impl Session {
    /// Whether the session is expired (with a 60 second buffer).
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => Utc::now().timestamp() > exp - EXPIRY_BUFFER_SECS,
            None => false,
        }
    }
}
