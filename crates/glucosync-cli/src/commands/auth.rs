//! Stored portal session management.
//!
//! The portal only issues sessions through its interactive login; this
//! command installs a captured session into the OS keyring for the sync
//! cycle to use.

use clap::Subcommand;
use glucosync_core::{Session, StoredSessionAuthenticator};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a portal session captured from the portal login
    SetToken {
        /// Portal identity (account/user id)
        identity: String,
        /// Authorization header value, e.g. "Bearer eyJ..."
        token: String,
        /// Session lifetime in seconds from now (omit if the portal gave none)
        #[arg(long)]
        expires_in: Option<i64>,
    },
    /// Show the stored session (credential redacted)
    Show,
    /// Remove the stored session
    Clear,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::SetToken {
            identity,
            token,
            expires_in,
        } => {
            let session = Session {
                identity,
                credential_header: token,
                expires_at: expires_in.map(|secs| chrono::Utc::now().timestamp() + secs),
            };
            StoredSessionAuthenticator::store_session(&session)?;
            println!("session stored for {}", session.identity);
        }
        AuthAction::Show => match StoredSessionAuthenticator::stored_session() {
            Some(session) => {
                println!("identity:   {}", session.identity);
                match session.expires_at {
                    Some(exp) => {
                        let state = if session.is_expired() { "expired" } else { "valid" };
                        println!("expires_at: {exp} ({state})");
                    }
                    None => println!("expires_at: none"),
                }
            }
            None => println!("no stored session"),
        },
        AuthAction::Clear => {
            StoredSessionAuthenticator::clear_session()?;
            println!("session cleared");
        }
    }
    Ok(())
}
