use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use stockfolio::models::{Holding, Portfolio, User};
use stockfolio::storage::PersistenceSource;

pub fn holding(symbol: &str, shares: u32, price: i64) -> Holding {
    Holding::new(
        symbol,
        shares,
        Decimal::from(price),
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
    )
    .unwrap()
}

/// Backend that refuses every portfolio commit, as if the server were down.
/// Session snapshots still succeed so restore paths stay quiet.
pub struct UnreachableRemote;

#[async_trait]
impl PersistenceSource for UnreachableRemote {
    async fn load_session(&self) -> Result<Option<User>> {
        Ok(None)
    }

    async fn save_session(&self, _user: &User) -> Result<()> {
        Ok(())
    }

    async fn clear_session(&self) -> Result<()> {
        Ok(())
    }

    async fn create_portfolio(&self, _user_id: u64, _name: &str) -> Result<Portfolio> {
        Err(anyhow::anyhow!("connection refused"))
    }

    async fn delete_portfolio(&self, _id: u64) -> Result<()> {
        Err(anyhow::anyhow!("connection refused"))
    }

    async fn upsert_holding(&self, _portfolio_id: u64, _holding: &Holding) -> Result<()> {
        Err(anyhow::anyhow!("connection refused"))
    }

    async fn delete_holding(&self, _portfolio_id: u64, _symbol: &str) -> Result<()> {
        Err(anyhow::anyhow!("connection refused"))
    }
}

/// Backend that accepts every commit and records the order they arrive in.
#[derive(Default)]
pub struct RecordingRemote {
    pub calls: Mutex<Vec<String>>,
    next_id: Mutex<u64>,
}

impl RecordingRemote {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: Mutex::new(100),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PersistenceSource for RecordingRemote {
    async fn load_session(&self) -> Result<Option<User>> {
        Ok(None)
    }

    async fn save_session(&self, _user: &User) -> Result<()> {
        Ok(())
    }

    async fn clear_session(&self) -> Result<()> {
        Ok(())
    }

    async fn create_portfolio(&self, _user_id: u64, name: &str) -> Result<Portfolio> {
        self.record(format!("create {name}"));
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        Ok(Portfolio::new(*next_id, name))
    }

    async fn delete_portfolio(&self, id: u64) -> Result<()> {
        self.record(format!("delete portfolio {id}"));
        Ok(())
    }

    async fn upsert_holding(&self, portfolio_id: u64, holding: &Holding) -> Result<()> {
        self.record(format!("upsert {} in {portfolio_id}", holding.symbol));
        Ok(())
    }

    async fn delete_holding(&self, portfolio_id: u64, symbol: &str) -> Result<()> {
        self.record(format!("remove {symbol} from {portfolio_id}"));
        Ok(())
    }
}
