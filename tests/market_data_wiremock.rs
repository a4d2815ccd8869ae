use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use stockfolio::market_data::{HttpMarketData, QuoteSource, RiskLevel, StrategySource};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUOTE_TABLE: &str = r#"[
    {"symbol": "AAPL", "name": "Apple Inc.", "price": 180.95, "change": 2.3},
    {"symbol": "AMZN", "name": "Amazon.com Inc.", "price": 3550.5, "change": -12.3}
]"#;

#[tokio::test]
async fn quote_table_round_trips() -> Result<()> {
    let server = MockServer::start().await;
    let gateway = HttpMarketData::new().with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/api/stocks"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(QUOTE_TABLE, "application/json"))
        .mount(&server)
        .await;

    let quotes = gateway.quotes().await?;
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[0].price, "180.95".parse::<Decimal>().unwrap());
    assert_eq!(quotes[1].change, "-12.3".parse::<Decimal>().unwrap());

    // Single-quote lookups scan the same table, case-insensitively.
    let amzn = gateway.quote("amzn").await?.expect("expected AMZN quote");
    assert_eq!(amzn.symbol, "AMZN");
    Ok(())
}

#[tokio::test]
async fn history_forwards_the_day_count() -> Result<()> {
    let server = MockServer::start().await;
    let gateway = HttpMarketData::new().with_base_url(server.uri());

    let body = r#"[
        {"date": "2024-06-12", "price": 178.02},
        {"date": "2024-06-13", "price": 180.11}
    ]"#;
    Mock::given(method("GET"))
        .and(path("/api/stocks/history/AAPL"))
        .and(query_param("days", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let points = gateway.history("AAPL", 7).await?;
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 6, 12).unwrap());
    assert_eq!(points[1].price, "180.11".parse::<Decimal>().unwrap());
    Ok(())
}

#[tokio::test]
async fn missing_history_is_an_empty_series() -> Result<()> {
    let server = MockServer::start().await;
    let gateway = HttpMarketData::new().with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/api/stocks/history/ZZZZ"))
        .respond_with(ResponseTemplate::new(404).set_body_raw(
            r#"{"error": "Stock symbol not found"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let points = gateway.history("ZZZZ", 30).await?;
    assert!(points.is_empty());
    Ok(())
}

#[tokio::test]
async fn blank_searches_skip_http() -> Result<()> {
    let server = MockServer::start().await;
    let gateway = HttpMarketData::new().with_base_url(server.uri());

    let quotes = gateway.search("   ").await?;
    assert!(quotes.is_empty());

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty(), "expected no HTTP requests");
    Ok(())
}

#[tokio::test]
async fn search_forwards_the_query() -> Result<()> {
    let server = MockServer::start().await;
    let gateway = HttpMarketData::new().with_base_url(server.uri());

    let body = r#"[{"symbol": "AAPL", "name": "Apple Inc.", "price": 180.95, "change": 2.3}]"#;
    Mock::given(method("GET"))
        .and(path("/api/stocks/search"))
        .and(query_param("query", "app"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let quotes = gateway.search("app").await?;
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].name, "Apple Inc.");
    Ok(())
}

#[tokio::test]
async fn strategies_map_their_camel_case_rows() -> Result<()> {
    let server = MockServer::start().await;
    let gateway = HttpMarketData::new().with_base_url(server.uri());

    let body = r#"[{
        "id": 2,
        "name": "Tech Innovation",
        "description": "Invest in cutting-edge technology companies poised for rapid growth.",
        "riskLevel": "High",
        "expectedReturn": "12-20%",
        "recommendedStocks": ["TSLA", "NVDA", "GOOGL", "META", "AMZN"]
    }]"#;
    Mock::given(method("GET"))
        .and(path("/api/strategies"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let strategies = gateway.strategies().await?;
    assert_eq!(strategies.len(), 1);
    assert_eq!(strategies[0].risk, RiskLevel::High);
    assert_eq!(strategies[0].recommended_symbols.len(), 5);
    Ok(())
}

#[tokio::test]
async fn unknown_strategy_ids_come_back_as_none() -> Result<()> {
    let server = MockServer::start().await;
    let gateway = HttpMarketData::new().with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/api/strategies/9"))
        .respond_with(ResponseTemplate::new(404).set_body_raw(
            r#"{"error": "Strategy not found"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    assert!(gateway.strategy(9).await?.is_none());
    Ok(())
}
