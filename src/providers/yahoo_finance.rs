use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::holding::AssetClass;
use crate::core::{CurrencyRateProvider, PriceProvider};
use crate::providers::util::{get_json, with_query};

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

impl ChartItem {
    /// Market price, or the most recent close when the market price is absent.
    fn latest_price(&self) -> Option<f64> {
        self.meta.regular_market_price.filter(|p| *p > 0.0).or_else(|| {
            self.indicators
                .as_ref()
                .and_then(|inds| inds.quote.first())
                .and_then(|q| q.close.as_ref())
                .and_then(|closes| closes.iter().rev().find_map(|c| *c))
        })
    }
}

async fn fetch_chart(client: &reqwest::Client, base_url: &str, symbol: &str) -> Result<f64> {
    let url = format!("{base_url}/v8/finance/chart/{symbol}?interval=1d&range=5d");
    let data: YahooChartResponse = get_json(client, &url, symbol).await?;
    let item = data
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;

    item.latest_price()
        .ok_or_else(|| anyhow!("No usable price in chart for symbol: {}", symbol))
}

/// Quotes from Yahoo's chart endpoint. Serves every asset class.
pub struct YahooChartProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooChartProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        YahooChartProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl PriceProvider for YahooChartProvider {
    fn name(&self) -> &str {
        "Yahoo Chart"
    }

    fn supports(&self, _asset_class: AssetClass) -> bool {
        true
    }

    #[instrument(
        name = "YahooChartFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<f64> {
        let price = fetch_chart(&self.client, &self.base_url, symbol).await?;
        debug!(price, "Received Yahoo chart price");
        Ok(price)
    }
}

#[derive(Deserialize, Debug)]
struct YahooSearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Deserialize, Debug)]
struct SearchQuote {
    symbol: Option<String>,
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

/// Quotes from Yahoo's search endpoint, used when the chart endpoint is
/// rate limited.
pub struct YahooSearchProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooSearchProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        YahooSearchProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl PriceProvider for YahooSearchProvider {
    fn name(&self) -> &str {
        "Yahoo Search"
    }

    fn supports(&self, _asset_class: AssetClass) -> bool {
        true
    }

    #[instrument(
        name = "YahooSearchFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<f64> {
        let url = with_query(
            &format!("{}/v1/finance/search", self.base_url),
            &[("q", symbol)],
        )?;
        let data: YahooSearchResponse = get_json(&self.client, &url, symbol).await?;

        data.quotes
            .iter()
            .filter(|q| q.symbol.as_deref() == Some(symbol))
            .find_map(|q| q.regular_market_price.filter(|p| *p > 0.0))
            .ok_or_else(|| anyhow!("Symbol not found in search results: {}", symbol))
    }
}

/// Exchange rates from Yahoo's `{FROM}{TO}=X` currency charts.
pub struct YahooCurrencyProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooCurrencyProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        YahooCurrencyProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl CurrencyRateProvider for YahooCurrencyProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let symbol = format!("{from}{to}=X");
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, symbol
        );
        let data: YahooChartResponse = get_json(&self.client, &url, &symbol).await?;

        data.chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|item| item.meta.regular_market_price)
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", symbol))
    }
}
