//! Portal collaborators: session handling, authentication and raw series
//! fetching. The browser-driven portal login itself lives outside this crate;
//! operators install a captured session via the CLI and everything here works
//! from that stored credential.

pub mod auth;
pub mod client;
pub mod session;
pub mod traits;

pub use auth::StoredSessionAuthenticator;
pub use client::PortalClient;
pub use session::Session;
pub use traits::{Authenticator, SeriesFetcher};

/// Thin wrapper around the OS keyring for session storage.
pub mod session_store {
    const SERVICE: &str = "glucosync";

    pub fn get(key: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
