//! Session state tracking for the admin surface.
//!
//! The manager mirrors the remote auth service's view of the session for the
//! presentation layer. Privileged repository operations do their own session
//! check against the remote; this state exists so the UI can decide what to
//! render without a round trip.

use crema_remote::{AuthApi, RemoteError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Authentication state as last observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No check has run yet.
    Unknown,
    /// A live session was observed.
    Authenticated,
    /// No session, or the last one was cleared.
    Unauthenticated,
}

/// Session operation errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Login failed. Deliberately generic: the underlying cause is logged for
    /// operators but never surfaced, so failed logins cannot be used to probe
    /// which accounts exist.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Remote sign-out failed after the local state was already cleared.
    #[error("remote sign-out failed: {0}")]
    SignOut(RemoteError),
}

/// Tracks whether a valid session exists.
pub struct SessionManager {
    remote: Arc<dyn crema_remote::RemoteService>,
    state: RwLock<SessionState>,
}

impl SessionManager {
    /// Create a manager over the given remote service.
    pub fn new(remote: Arc<dyn crema_remote::RemoteService>) -> Self {
        Self {
            remote,
            state: RwLock::new(SessionState::Unknown),
        }
    }

    /// Current state as last observed.
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// Whether the last observation was an authenticated session.
    pub async fn is_authenticated(&self) -> bool {
        *self.state.read().await == SessionState::Authenticated
    }

    /// Query the remote service for an active session and resolve the local
    /// state. Never fails: an errored check resolves to unauthenticated.
    pub async fn check_session(&self) -> bool {
        let authenticated = match self.remote.get_session().await {
            Ok(session) => session.is_some(),
            Err(err) => {
                tracing::warn!(error = %err, "session check failed");
                false
            }
        };

        *self.state.write().await = if authenticated {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        };
        authenticated
    }

    /// Submit credentials. Any failure collapses to
    /// `SessionError::InvalidCredentials` for the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        match self.remote.sign_in_with_password(email, password).await {
            Ok(session) => {
                *self.state.write().await = SessionState::Authenticated;
                tracing::info!(user = ?session.user_email, "signed in");
                Ok(())
            }
            Err(err) => {
                *self.state.write().await = SessionState::Unauthenticated;
                tracing::warn!(error = %err, "login failed");
                Err(SessionError::InvalidCredentials)
            }
        }
    }

    /// Sign out. The local state transitions to unauthenticated before the
    /// remote result is known: a stale remote session is a better failure
    /// mode than a client that still believes it is signed in.
    pub async fn logout(&self) -> Result<(), SessionError> {
        *self.state.write().await = SessionState::Unauthenticated;

        match self.remote.sign_out().await {
            Ok(()) => {
                tracing::info!("signed out");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "remote sign-out failed, local session cleared anyway");
                Err(SessionError::SignOut(err))
            }
        }
    }
}
