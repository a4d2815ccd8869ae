use std::sync::{Arc, Mutex};

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::error::Error;
use crate::models::User;
use crate::portfolio::SharedStore;
use crate::storage::PersistenceSource;

use super::{AuthSource, NewUser, Registration};

/// Where the session currently stands. `Authenticating` is observable from
/// other tasks while a credential check is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated { user_id: u64, username: String },
}

/// Owns the active identity and scopes the portfolio store to it.
///
/// Login and registration go through the [`AuthSource`]; the persisted
/// session snapshot is written on open and cleared on logout. A snapshot
/// that cannot be written never fails the transition, the session just
/// will not survive a restart.
pub struct SessionManager {
    auth: Arc<dyn AuthSource>,
    persistence: Arc<dyn PersistenceSource>,
    store: SharedStore,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(
        auth: Arc<dyn AuthSource>,
        persistence: Arc<dyn PersistenceSource>,
        store: SharedStore,
    ) -> Self {
        Self {
            auth,
            persistence,
            store,
            state: Mutex::new(SessionState::Anonymous),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.lock().expect("session state lock poisoned").clone()
    }

    fn set_state(&self, next: SessionState) {
        *self.state.lock().expect("session state lock poisoned") = next;
    }

    /// Authenticate and open a session for `username`.
    ///
    /// Rejected credentials yield [`Error::Auth`]; transport failures from
    /// the auth source propagate as-is. Either way the state returns to
    /// `Anonymous`.
    pub async fn login(&self, username: &str, password: SecretString) -> Result<User> {
        self.set_state(SessionState::Authenticating);

        let verified = match self.auth.verify(username, &password).await {
            Ok(verified) => verified,
            Err(err) => {
                self.set_state(SessionState::Anonymous);
                return Err(err);
            }
        };

        let Some(user) = verified else {
            self.set_state(SessionState::Anonymous);
            return Err(Error::auth("invalid username or password").into());
        };

        self.open_session(user).await
    }

    /// Create an account and open a session for it.
    ///
    /// A duplicate username or email yields [`Error::Validation`], which is
    /// distinct from transport failures reaching the auth source.
    pub async fn register(&self, signup: NewUser) -> Result<User> {
        if signup.username.trim().is_empty()
            || signup.password.expose_secret().is_empty()
            || signup.name.trim().is_empty()
            || signup.email.trim().is_empty()
        {
            return Err(Error::validation("missing required fields").into());
        }

        self.set_state(SessionState::Authenticating);

        let outcome = match self.auth.create(&signup).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.set_state(SessionState::Anonymous);
                return Err(err);
            }
        };

        match outcome {
            Registration::Created(user) => self.open_session(user).await,
            Registration::DuplicateUsername => {
                self.set_state(SessionState::Anonymous);
                Err(Error::validation("username already exists").into())
            }
            Registration::DuplicateEmail => {
                self.set_state(SessionState::Anonymous);
                Err(Error::validation("email already exists").into())
            }
        }
    }

    /// Close the session. Always succeeds; a persisted snapshot that cannot
    /// be cleared is logged and left behind.
    pub async fn logout(&self) {
        let mut store = self.store.lock().await;
        store.clear();
        if let Err(err) = self.persistence.clear_session().await {
            warn!(error = %err, "failed to clear persisted session");
        }
        drop(store);

        self.set_state(SessionState::Anonymous);
        info!("session closed");
    }

    /// Restore the persisted session from the last run, if any.
    ///
    /// Anything short of a structurally valid snapshot degrades to
    /// `Anonymous` without surfacing an error.
    pub async fn restore(&self) -> Option<User> {
        let snapshot = match self.persistence.load_session().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "session restore failed, starting anonymous");
                return None;
            }
        };
        let user = snapshot?;
        if let Err(err) = user.validate() {
            warn!(error = %err, "persisted session is malformed, starting anonymous");
            return None;
        }

        let mut store = self.store.lock().await;
        store.install_user(user.clone());
        drop(store);

        self.set_state(SessionState::Authenticated {
            user_id: user.id,
            username: user.username.clone(),
        });
        info!(username = %user.username, "session restored");
        Some(user)
    }

    async fn open_session(&self, user: User) -> Result<User> {
        let mut store = self.store.lock().await;
        store.install_user(user.clone());
        if let Err(err) = self.persistence.save_session(&user).await {
            warn!(error = %err, "failed to persist session snapshot");
        }
        drop(store);

        self.set_state(SessionState::Authenticated {
            user_id: user.id,
            username: user.username.clone(),
        });
        info!(username = %user.username, "session opened");
        Ok(user)
    }
}
