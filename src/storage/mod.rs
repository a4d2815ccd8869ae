mod http;
mod json_file;
mod memory;
mod session_file;

pub use http::HttpStore;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use session_file::SessionFile;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Holding, Portfolio, User};

/// Source of truth for persisted session and portfolio state.
///
/// Implementations map between the canonical models and whatever shape
/// their backend speaks; nothing outside this module sees a wire format.
#[async_trait::async_trait]
pub trait PersistenceSource: Send + Sync {
    async fn load_session(&self) -> Result<Option<User>>;
    async fn save_session(&self, user: &User) -> Result<()>;
    async fn clear_session(&self) -> Result<()>;

    /// Create a portfolio and return the canonical record, including the
    /// id the backend assigned (which may differ from any local guess).
    async fn create_portfolio(&self, user_id: u64, name: &str) -> Result<Portfolio>;
    async fn delete_portfolio(&self, id: u64) -> Result<()>;
    async fn upsert_holding(&self, portfolio_id: u64, holding: &Holding) -> Result<()>;
    async fn delete_holding(&self, portfolio_id: u64, symbol: &str) -> Result<()>;
}

fn demo_holding(symbol: &str, shares: u32, price: i64, date: (i32, u32, u32)) -> Holding {
    Holding {
        symbol: symbol.to_string(),
        shares,
        purchase_price: Decimal::from(price),
        purchase_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid seed date"),
    }
}

/// Accounts seeded into fresh local backends, matching the demo data the
/// HTTP backend ships with. Returns (user, password) pairs.
fn seed_accounts() -> Vec<(User, String)> {
    let admin = User {
        id: 1,
        username: "admin".to_string(),
        name: "Admin User".to_string(),
        email: "admin@example.com".to_string(),
        portfolios: vec![
            Portfolio {
                id: 1,
                name: "Tech Portfolio".to_string(),
                holdings: vec![
                    demo_holding("AAPL", 10, 150, (2023, 1, 5)),
                    demo_holding("MSFT", 5, 280, (2023, 2, 10)),
                    demo_holding("GOOGL", 2, 2700, (2023, 3, 15)),
                ],
            },
            Portfolio {
                id: 2,
                name: "Value Stocks".to_string(),
                holdings: vec![
                    demo_holding("JNJ", 8, 160, (2023, 1, 20)),
                    demo_holding("PG", 7, 140, (2023, 2, 25)),
                ],
            },
        ],
    };

    vec![(admin, "admin".to_string())]
}
