pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod market_data;
pub mod models;
pub mod portfolio;
pub mod session;
pub mod storage;
pub mod sync;
