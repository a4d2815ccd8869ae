//! Persistence served by the stock advisor HTTP API.
//!
//! Accounts and portfolios arrive in the API's shape (float-typed prices,
//! `stocks` instead of holdings) and are converted to the canonical models
//! at this boundary. The session snapshot itself stays in a local file, the
//! server only holds account state.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::models::{Holding, Portfolio, User};
use crate::session::{AuthSource, NewUser, Registration};

use super::{PersistenceSource, SessionFile};

const STOCK_API_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Deserialize)]
struct WireUser {
    id: u64,
    username: String,
    name: String,
    email: String,
    #[serde(default)]
    portfolios: Vec<WirePortfolio>,
}

#[derive(Debug, Deserialize)]
struct WirePortfolio {
    id: u64,
    name: String,
    #[serde(default)]
    stocks: Vec<WireStock>,
}

#[derive(Debug, Deserialize)]
struct WireStock {
    symbol: String,
    shares: u32,
    purchase_price: f64,
    purchase_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: WireUser,
}

#[derive(Debug, Deserialize)]
struct PortfolioEnvelope {
    portfolio: WirePortfolio,
}

fn to_decimal(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value).with_context(|| format!("{value} is not a finite number"))
}

impl WireStock {
    fn into_holding(self) -> Result<Holding> {
        let purchase_price = to_decimal(self.purchase_price)
            .with_context(|| format!("purchase price for {}", self.symbol))?;
        Ok(Holding {
            symbol: self.symbol,
            shares: self.shares,
            purchase_price,
            purchase_date: self.purchase_date,
        })
    }
}

impl WirePortfolio {
    fn into_portfolio(self) -> Result<Portfolio> {
        let holdings = self
            .stocks
            .into_iter()
            .map(WireStock::into_holding)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("portfolio {}", self.id))?;
        Ok(Portfolio {
            id: self.id,
            name: self.name,
            holdings,
        })
    }
}

impl WireUser {
    fn into_user(self) -> Result<User> {
        let portfolios = self
            .portfolios
            .into_iter()
            .map(WirePortfolio::into_portfolio)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("user {}", self.id))?;
        Ok(User {
            id: self.id,
            username: self.username,
            name: self.name,
            email: self.email,
            portfolios,
        })
    }
}

/// Account and portfolio gateway over the stock advisor API.
pub struct HttpStore {
    client: Client,
    base_url: String,
    session: SessionFile,
}

impl HttpStore {
    /// Gateway against the default local API address, with the session
    /// snapshot kept under `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            client: Client::new(),
            base_url: STOCK_API_BASE_URL.to_string(),
            session: SessionFile::new(data_dir),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Point at a different server. Tests aim this at a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait::async_trait]
impl AuthSource for HttpStore {
    async fn verify(&self, username: &str, password: &SecretString) -> Result<Option<User>> {
        let url = format!("{}/api/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "username": username,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .context("requesting login")?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let envelope = response
            .error_for_status()?
            .json::<UserEnvelope>()
            .await
            .context("reading login response")?;
        Ok(Some(envelope.user.into_user()?))
    }

    async fn create(&self, signup: &NewUser) -> Result<Registration> {
        let url = format!("{}/api/register", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "username": signup.username,
                "email": signup.email,
                "password": signup.password.expose_secret(),
                "name": signup.name,
            }))
            .send()
            .await
            .context("requesting registration")?;

        if response.status() == StatusCode::CONFLICT {
            let rejection = response
                .json::<WireError>()
                .await
                .context("reading registration rejection")?;
            return if rejection.error.contains("Username") {
                Ok(Registration::DuplicateUsername)
            } else if rejection.error.contains("Email") {
                Ok(Registration::DuplicateEmail)
            } else {
                Err(anyhow::anyhow!("registration rejected: {}", rejection.error))
            };
        }

        let envelope = response
            .error_for_status()?
            .json::<UserEnvelope>()
            .await
            .context("reading registration response")?;
        Ok(Registration::Created(envelope.user.into_user()?))
    }
}

#[async_trait::async_trait]
impl PersistenceSource for HttpStore {
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
        let url = format!("{}/api/portfolios", self.base_url);
        let envelope = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "user_id": user_id, "name": name }))
            .send()
            .await
            .context("requesting portfolio creation")?
            .error_for_status()?
            .json::<PortfolioEnvelope>()
            .await
            .context("reading portfolio creation response")?;
        envelope.portfolio.into_portfolio()
    }

    async fn delete_portfolio(&self, id: u64) -> Result<()> {
        let url = format!("{}/api/portfolios/{id}", self.base_url);
        self.client
            .delete(&url)
            .send()
            .await
            .with_context(|| format!("requesting deletion of portfolio {id}"))?
            .error_for_status()?;
        Ok(())
    }

    async fn upsert_holding(&self, portfolio_id: u64, holding: &Holding) -> Result<()> {
        let purchase_price = holding
            .purchase_price
            .to_f64()
            .with_context(|| format!("purchase price for {} out of range", holding.symbol))?;
        let url = format!("{}/api/stocks", self.base_url);
        self.client
            .post(&url)
            .json(&serde_json::json!({
                "portfolio_id": portfolio_id,
                "symbol": holding.symbol,
                "shares": holding.shares,
                "purchase_price": purchase_price,
                "purchase_date": holding.purchase_date,
            }))
            .send()
            .await
            .with_context(|| format!("requesting upsert of {}", holding.symbol))?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_holding(&self, portfolio_id: u64, symbol: &str) -> Result<()> {
        let url = format!("{}/api/stocks/{portfolio_id}/{symbol}", self.base_url);
        self.client
            .delete(&url)
            .send()
            .await
            .with_context(|| format!("requesting removal of {symbol}"))?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_USER: &str = r#"{
        "user": {
            "id": 1,
            "username": "admin",
            "name": "Admin User",
            "email": "admin@example.com",
            "portfolios": [
                {
                    "id": 1,
                    "user_id": 1,
                    "name": "Tech Portfolio",
                    "stocks": [
                        {
                            "id": 1,
                            "portfolio_id": 1,
                            "symbol": "AAPL",
                            "shares": 10,
                            "purchase_price": 150.0,
                            "purchase_date": "2023-01-05"
                        }
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn user_envelope_maps_to_canonical_models() {
        let envelope: UserEnvelope = serde_json::from_str(SAMPLE_USER).unwrap();
        let user = envelope.user.into_user().unwrap();

        assert_eq!(user.username, "admin");
        let portfolio = &user.portfolios[0];
        assert_eq!(portfolio.name, "Tech Portfolio");
        assert_eq!(portfolio.holdings[0].symbol, "AAPL");
        assert_eq!(
            portfolio.holdings[0].purchase_price,
            Decimal::from(150)
        );
    }

    #[test]
    fn non_finite_prices_are_rejected() {
        let stock = WireStock {
            symbol: "AAPL".to_string(),
            shares: 1,
            purchase_price: f64::NAN,
            purchase_date: NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
        };
        assert!(stock.into_holding().is_err());
    }

    #[test]
    fn base_url_override_drops_trailing_slashes() {
        let dir = tempfile::tempdir().unwrap();
        let store = HttpStore::new(dir.path()).with_base_url("http://127.0.0.1:9000/");
        assert_eq!(store.base_url, "http://127.0.0.1:9000");
    }
}
