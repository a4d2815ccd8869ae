//! Session lifecycle: establishing, restoring, and tearing down the
//! identity that scopes the portfolio store.

mod manager;

pub use manager::{SessionManager, SessionState};

use anyhow::Result;
use secrecy::SecretString;

use crate::models::User;

/// Credential checks, delegated to whatever backend is configured.
///
/// The session manager orchestrates state transitions; it never sees or
/// stores credentials beyond passing them through.
#[async_trait::async_trait]
pub trait AuthSource: Send + Sync {
    /// Check a username/password pair. `Ok(None)` means the credentials
    /// were rejected; `Err` is a transport or source failure.
    async fn verify(&self, username: &str, password: &SecretString) -> Result<Option<User>>;

    /// Open a new account. Duplicates come back in the outcome rather than
    /// as errors so callers can tell them apart from transport failures.
    async fn create(&self, signup: &NewUser) -> Result<Registration>;
}

/// Everything needed to open an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: SecretString,
    pub name: String,
    pub email: String,
}

/// Outcome of [`AuthSource::create`].
#[derive(Debug, Clone)]
pub enum Registration {
    Created(User),
    DuplicateUsername,
    DuplicateEmail,
}
