use chrono::{NaiveDate, TimeZone, Utc};
use folio::App;
use folio::core::config::{AppConfig, ProviderEndpoint};
use folio::core::holding::{AssetClass, ConvictionTier};
use folio::core::{Clock, Currency, ManualClock, NewHolding};
use folio::store::{DiskHoldingStore, HoldingStore, MemoryHoldingStore};
use std::fs;
use std::sync::Arc;
use tracing::info;
use wiremock::MockServer;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub fn chart_body(price: f64) -> String {
        format!(
            r#"{{"chart": {{"result": [{{
                "meta": {{"regularMarketPrice": {price}, "currency": "USD"}},
                "indicators": {{"quote": [{{"close": [{price}]}}]}}
            }}]}}}}"#
        )
    }

    pub async fn mount_chart(server: &MockServer, symbol: &str, price: f64) {
        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{symbol}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(chart_body(price)))
            .mount(server)
            .await;
    }

    pub async fn mount_coin(server: &MockServer, id: &str, price: f64) {
        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .and(query_param("ids", id))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{"{id}": {{"usd": {price}}}}}"#)),
            )
            .mount(server)
            .await;
    }

    pub async fn mount_nav(server: &MockServer, isin: &str, nav: f64) {
        Mock::given(method("GET"))
            .and(path(format!("/nav/{isin}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{"nav": {nav}, "date": "2024-05-31"}}"#)),
            )
            .mount(server)
            .await;
    }
}

/// Config with every source pointed at `server`.
fn config_for(server: &MockServer) -> AppConfig {
    let endpoint = ProviderEndpoint {
        base_url: server.uri(),
        api_key: None,
    };
    let mut config = AppConfig::default();
    config.providers.yahoo = endpoint.clone();
    config.providers.exchangerate_api = endpoint.clone();
    config.providers.fixer = endpoint.clone();
    config.providers.coingecko = endpoint.clone();
    config.providers.amfi = endpoint.clone();
    config.providers.alpha_vantage = endpoint;
    config.refresh.source_pause_ms = 0;
    config.refresh.request_timeout_secs = 2;
    config
}

fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
    ))
}

fn new_holding(asset_class: AssetClass, ticker: &str, units: f64, buy: f64) -> NewHolding {
    NewHolding {
        asset_class,
        ticker: ticker.to_string(),
        name: ticker.to_string(),
        units,
        native_buy_price: buy,
        buy_currency: None,
        conviction: ConvictionTier::High,
        thesis: "long term".to_string(),
        category: None,
        purchase_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test_log::test(tokio::test)]
async fn test_full_portfolio_flow_with_mock_sources() {
    let server = MockServer::start().await;
    test_utils::mount_chart(&server, "AAPL", 120.0).await;
    test_utils::mount_chart(&server, "INFY.NS", 1500.0).await;
    test_utils::mount_chart(&server, "USDINR=X", 83.5).await;
    test_utils::mount_coin(&server, "bitcoin", 60000.0).await;
    test_utils::mount_nav(&server, "INF209K01YN0", 45.5).await;

    let clock = manual_clock();
    let app = App::with_store(
        config_for(&server),
        Arc::new(MemoryHoldingStore::new()),
        clock.clone(),
    )
    .unwrap();

    let mut aapl = new_holding(AssetClass::Stock, "AAPL", 10.0, 100.0);
    aapl.category = Some("Equity".to_string());
    let aapl = app.holdings.create("alice", aapl).await.unwrap();
    assert_eq!(aapl.price_currency, Currency::Usd);
    assert_eq!(aapl.native_current_price, 120.0);

    let mut infy = new_holding(AssetClass::Stock, "INFY.NS", 5.0, 1400.0);
    infy.category = Some("Equity".to_string());
    let infy = app.holdings.create("alice", infy).await.unwrap();
    assert_eq!(infy.price_currency, Currency::Inr);
    assert_eq!(infy.buy_currency, Currency::Inr);

    // Bought with rupees, quoted in dollars
    let mut btc = new_holding(AssetClass::Crypto, "BTC-USD", 0.5, 4_000_000.0);
    btc.buy_currency = Some(Currency::Inr);
    btc.category = Some("Crypto".to_string());
    btc.conviction = ConvictionTier::Low;
    let btc = app.holdings.create("alice", btc).await.unwrap();
    assert_eq!(btc.price_currency, Currency::Usd);
    assert_eq!(btc.native_current_price, 60000.0);

    let mut fund = new_holding(AssetClass::MutualFund, "INF209K01YN0", 100.0, 40.0);
    fund.conviction = ConvictionTier::Medium;
    let fund = app.holdings.create("bob", fund).await.unwrap();
    assert_eq!(fund.native_current_price, 45.5);

    let stats = app.holdings.stats("alice").await.unwrap();
    info!(?stats, "Portfolio snapshot");
    assert_eq!(stats.total_holdings, 3);
    assert_eq!(stats.usd_inr_rate, 83.5);
    assert_close(stats.total_invested_inr, 83_500.0 + 7_000.0 + 2_000_000.0);
    assert_close(stats.current_value_inr, 100_200.0 + 7_500.0 + 2_505_000.0);
    assert_close(stats.total_pnl_inr, 522_200.0);
    assert_eq!(stats.conviction.high, 2);
    assert_eq!(stats.conviction.low, 1);
    assert_eq!(stats.conviction.medium, 0);

    let views = app.holdings.metrics_for("alice").await.unwrap();
    let btc_view = views.iter().find(|v| v.holding.id == btc.id).unwrap();
    assert_eq!(btc_view.metrics.buy_price_display, "₹4,000,000.00");
    assert_eq!(btc_view.metrics.current_price_display, "$60,000.00");
    assert_eq!(btc_view.metrics.usd_inr_rate, Some(83.5));
    let infy_view = views.iter().find(|v| v.holding.id == infy.id).unwrap();
    assert_eq!(infy_view.metrics.usd_inr_rate, None);

    let report = app
        .holdings
        .allocation("alice", &AppConfig::default().allocation_goals)
        .await
        .unwrap();
    assert_close(report.total_value_inr, 2_612_700.0);
    assert_close(report.actual["Crypto"].value_inr, 2_505_000.0);

    // One rate fetch serves every call inside the TTL
    let rate_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/v8/finance/chart/USDINR=X")
        .count();
    assert_eq!(rate_requests, 1);

    let bob = app.holdings.stats("bob").await.unwrap();
    assert_eq!(bob.total_holdings, 1);
    assert_close(bob.current_value_inr, 4_550.0);
    assert_eq!(aapl.owner, "alice");
}

#[test_log::test(tokio::test)]
async fn test_failed_refresh_keeps_last_price() {
    let server = MockServer::start().await;
    test_utils::mount_chart(&server, "MSFT", 400.0).await;

    let clock = manual_clock();
    let store = Arc::new(MemoryHoldingStore::new());
    let app = App::with_store(config_for(&server), store.clone(), clock.clone()).unwrap();

    let created = app
        .holdings
        .create("alice", new_holding(AssetClass::Stock, "MSFT", 2.0, 300.0))
        .await
        .unwrap();
    let priced_at = created.last_price_refresh.unwrap();

    // Within the staleness window nothing is fetched
    clock.advance(chrono::Duration::minutes(10));
    let report = app.refresher.run_cycle().await.unwrap();
    assert_eq!(report.fresh, 1);

    // Every source now fails
    server.reset().await;
    clock.advance(chrono::Duration::minutes(10));
    let report = app.refresher.run_cycle().await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.updated, 0);

    let after = store.get("alice", created.id).await.unwrap().unwrap();
    assert_eq!(after.native_current_price, 400.0);
    assert_eq!(after.last_price_refresh, Some(priced_at));

    // Sources recover
    test_utils::mount_chart(&server, "MSFT", 410.0).await;
    let report = app.refresher.run_cycle().await.unwrap();
    assert_eq!(report.updated, 1);
    let after = store.get("alice", created.id).await.unwrap().unwrap();
    assert_eq!(after.native_current_price, 410.0);
    assert_eq!(after.last_price_refresh, Some(clock.now()));
}

#[test_log::test(tokio::test)]
async fn test_rate_falls_back_when_all_sources_fail() {
    let server = MockServer::start().await;
    let app = App::with_store(
        config_for(&server),
        Arc::new(MemoryHoldingStore::new()),
        manual_clock(),
    )
    .unwrap();

    assert_eq!(app.rates.get_rate().await, 83.0);
    assert!(app.rates.cached().await.is_none());

    // A holding whose price cannot be found is still saved
    let created = app
        .holdings
        .create("alice", new_holding(AssetClass::Stock, "NOPE", 1.0, 10.0))
        .await
        .unwrap();
    assert_eq!(created.native_current_price, 0.0);
    assert!(created.last_price_refresh.is_none());

    let stats = app.holdings.stats("alice").await.unwrap();
    assert_close(stats.total_invested_inr, 830.0);
    assert_eq!(stats.current_value_inr, 0.0);
    assert_close(stats.net_return_percent, -100.0);
}

#[test_log::test(tokio::test)]
async fn test_cli_flow_with_disk_store() {
    let server = MockServer::start().await;
    test_utils::mount_chart(&server, "AAPL", 175.5).await;
    test_utils::mount_chart(&server, "USDINR=X", 83.2).await;

    let data_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();
    let uri = server.uri();
    let config_content = format!(
        r#"
        owner: "carol"
        data_path: "{data}"
        providers:
          yahoo:
            base_url: "{uri}"
          exchangerate_api:
            base_url: "{uri}"
          fixer:
            base_url: "{uri}"
          coingecko:
            base_url: "{uri}"
          amfi:
            base_url: "{uri}"
          alpha_vantage:
            base_url: "{uri}"
        refresh:
          source_pause_ms: 0
        allocation_goals:
          - category: "Uncategorized"
            target_percent: 100.0
    "#,
        data = data_dir.path().display(),
    );
    fs::write(config_path, &config_content).expect("Failed to write config file");
    let config_path = config_path.to_str().unwrap();

    let add = new_holding(AssetClass::Stock, "AAPL", 10.5, 150.0);
    for command in [
        folio::AppCommand::Add(add),
        folio::AppCommand::Holdings,
        folio::AppCommand::Stats,
        folio::AppCommand::Alloc,
        folio::AppCommand::Rate,
        folio::AppCommand::Refresh,
    ] {
        let result = folio::run_command(command, Some(config_path)).await;
        assert!(
            result.is_ok(),
            "Command failed with: {:?}",
            result.err()
        );
    }

    let result = folio::run_command(folio::AppCommand::Remove { id: 42 }, Some(config_path)).await;
    assert!(result.is_err());

    let store = DiskHoldingStore::open(data_dir.path()).unwrap();
    let holdings = store.list("carol").await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].ticker, "AAPL");
    assert_eq!(holdings[0].native_current_price, 175.5);
    assert!(store.list("default").await.unwrap().is_empty());
}
