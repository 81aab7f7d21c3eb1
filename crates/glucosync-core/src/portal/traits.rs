use crate::portal::session::Session;
use crate::sync::types::{FetchWindow, RawBands, SyncError};

/// Yields an authenticated portal session.
///
/// Implementations own the mechanics of obtaining credentials (stored token,
/// browser-driven login, test double); the orchestrator only sees the session
/// value.
pub trait Authenticator {
    /// Produce a session. `force_new` discards any cached credential and
    /// authenticates from scratch, used after the portal rejects a session
    /// mid-cycle.
    fn authenticate(&mut self, force_new: bool) -> Result<Session, SyncError>;
}

/// Fetches the raw banded time series for a window.
pub trait SeriesFetcher {
    /// Fetch all three bands for the window. Fails with
    /// [`SyncError::AuthExpired`] when the portal no longer accepts the
    /// session, which triggers re-authentication upstream.
    fn fetch(&self, session: &Session, window: &FetchWindow) -> Result<RawBands, SyncError>;
}
