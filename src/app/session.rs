use anyhow::Result;
use secrecy::SecretString;

use crate::error::Error;
use crate::models::User;
use crate::portfolio::SharedStore;
use crate::session::{NewUser, SessionManager};

use super::types::{UserOutput, WhoamiOutput};

fn user_object(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "username": user.username,
        "name": user.name,
        "email": user.email,
        "portfolio_count": user.portfolios.len()
    })
}

/// Open a session with the given credentials.
///
/// Credential rejection and other local failures come back as a
/// `success: false` document; transport failures propagate.
pub async fn login(
    manager: &SessionManager,
    username: &str,
    password: SecretString,
) -> Result<serde_json::Value> {
    match manager.login(username, password).await {
        Ok(user) => Ok(serde_json::json!({
            "success": true,
            "user": user_object(&user)
        })),
        Err(err) => match err.downcast_ref::<Error>() {
            Some(local) => Ok(serde_json::json!({
                "success": false,
                "error": local.to_string()
            })),
            None => Err(err),
        },
    }
}

/// Create an account and open a session for it.
pub async fn register(manager: &SessionManager, signup: NewUser) -> Result<serde_json::Value> {
    match manager.register(signup).await {
        Ok(user) => Ok(serde_json::json!({
            "success": true,
            "user": user_object(&user)
        })),
        Err(err) => match err.downcast_ref::<Error>() {
            Some(local) => Ok(serde_json::json!({
                "success": false,
                "error": local.to_string()
            })),
            None => Err(err),
        },
    }
}

/// Close the current session. Succeeds even when there is none.
pub async fn logout(manager: &SessionManager) -> serde_json::Value {
    manager.logout().await;
    serde_json::json!({ "success": true })
}

/// Report the active user, if any.
pub async fn whoami(store: &SharedStore) -> WhoamiOutput {
    let store = store.lock().await;
    match store.user() {
        Some(user) => WhoamiOutput {
            authenticated: true,
            user: Some(UserOutput {
                id: user.id,
                username: user.username.clone(),
                name: user.name.clone(),
                email: user.email.clone(),
                portfolio_count: user.portfolios.len(),
            }),
        },
        None => WhoamiOutput {
            authenticated: false,
            user: None,
        },
    }
}
