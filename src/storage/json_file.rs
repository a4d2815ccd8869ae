use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::models::{Holding, Portfolio, User};
use crate::session::{AuthSource, NewUser, Registration};

use super::{seed_accounts, PersistenceSource, SessionFile};

/// JSON file-backed account store.
///
/// Layout:
/// ```text
/// data/
///   users.json     all accounts with their portfolios
///   session.json   last signed-in user snapshot
/// ```
///
/// A missing `users.json` behaves as the seeded demo table; the file is
/// written out on the first mutation.
pub struct JsonFileStore {
    users_path: PathBuf,
    session: SessionFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    id: u64,
    username: String,
    password: String,
    name: String,
    email: String,
    #[serde(default)]
    portfolios: Vec<Portfolio>,
}

impl UserRecord {
    fn from_parts(user: User, password: String) -> Self {
        Self {
            id: user.id,
            username: user.username,
            password,
            name: user.name,
            email: user.email,
            portfolios: user.portfolios,
        }
    }

    fn user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            portfolios: self.portfolios.clone(),
        }
    }
}

impl JsonFileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            users_path: data_dir.join("users.json"),
            session: SessionFile::new(data_dir),
        }
    }

    pub fn users_path(&self) -> &Path {
        &self.users_path
    }

    async fn load_users(&self) -> Result<Vec<UserRecord>> {
        match fs::read_to_string(&self.users_path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("failed to parse users file: {:?}", self.users_path)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(seed_accounts()
                .into_iter()
                .map(|(user, password)| UserRecord::from_parts(user, password))
                .collect()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read users file: {:?}", self.users_path))
            }
        }
    }

    async fn store_users(&self, users: &[UserRecord]) -> Result<()> {
        if let Some(parent) = self.users_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("failed to create data directory")?;
        }
        let content = serde_json::to_string_pretty(users).context("failed to serialize users")?;
        fs::write(&self.users_path, content)
            .await
            .with_context(|| format!("failed to write users file: {:?}", self.users_path))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthSource for JsonFileStore {
    async fn verify(&self, username: &str, password: &SecretString) -> Result<Option<User>> {
        let users = self.load_users().await?;
        Ok(users
            .iter()
            .find(|record| {
                record.username == username && record.password == password.expose_secret()
            })
            .map(UserRecord::user))
    }

    async fn create(&self, signup: &NewUser) -> Result<Registration> {
        let mut users = self.load_users().await?;
        if users
            .iter()
            .any(|record| record.username.eq_ignore_ascii_case(&signup.username))
        {
            return Ok(Registration::DuplicateUsername);
        }
        if users
            .iter()
            .any(|record| record.email.eq_ignore_ascii_case(&signup.email))
        {
            return Ok(Registration::DuplicateEmail);
        }

        let id = 1 + users.iter().map(|record| record.id).max().unwrap_or(0);
        let user = User::new(id, &signup.username, &signup.name, &signup.email);
        users.push(UserRecord::from_parts(
            user.clone(),
            signup.password.expose_secret().to_string(),
        ));
        self.store_users(&users).await?;
        Ok(Registration::Created(user))
    }
}

#[async_trait::async_trait]
impl PersistenceSource for JsonFileStore {
    async fn load_session(&self) -> Result<Option<User>> {
        self.session.load()
    }

    async fn save_session(&self, user: &User) -> Result<()> {
        self.session.save(user)
    }

    async fn clear_session(&self) -> Result<()> {
        self.session.clear()
    }

    async fn create_portfolio(&self, user_id: u64, name: &str) -> Result<Portfolio> {
        let mut users = self.load_users().await?;
        let record = users
            .iter_mut()
            .find(|record| record.id == user_id)
            .ok_or_else(|| anyhow::anyhow!("user {user_id} not found"))?;

        let next_id = 1 + record.portfolios.iter().map(|p| p.id).max().unwrap_or(0);
        let portfolio = Portfolio::new(next_id, name.trim());
        record.portfolios.push(portfolio.clone());
        self.store_users(&users).await?;
        Ok(portfolio)
    }

    async fn delete_portfolio(&self, id: u64) -> Result<()> {
        let mut users = self.load_users().await?;
        for record in users.iter_mut() {
            if let Some(index) = record.portfolios.iter().position(|p| p.id == id) {
                record.portfolios.remove(index);
                self.store_users(&users).await?;
                return Ok(());
            }
        }
        anyhow::bail!("portfolio {id} not found")
    }

    async fn upsert_holding(&self, portfolio_id: u64, holding: &Holding) -> Result<()> {
        let mut users = self.load_users().await?;
        let portfolio = find_portfolio(&mut users, portfolio_id)?;
        match portfolio.index_of(&holding.symbol) {
            Some(index) => portfolio.holdings[index] = holding.clone(),
            None => portfolio.holdings.push(holding.clone()),
        }
        self.store_users(&users).await
    }

    async fn delete_holding(&self, portfolio_id: u64, symbol: &str) -> Result<()> {
        let mut users = self.load_users().await?;
        let portfolio = find_portfolio(&mut users, portfolio_id)?;
        match portfolio.index_of(symbol) {
            Some(index) => {
                portfolio.holdings.remove(index);
            }
            None => anyhow::bail!("holding {symbol} not found in portfolio {portfolio_id}"),
        }
        self.store_users(&users).await
    }
}

fn find_portfolio(users: &mut [UserRecord], portfolio_id: u64) -> Result<&mut Portfolio> {
    users
        .iter_mut()
        .flat_map(|record| record.portfolios.iter_mut())
        .find(|portfolio| portfolio.id == portfolio_id)
        .ok_or_else(|| anyhow::anyhow!("portfolio {portfolio_id} not found"))
}
