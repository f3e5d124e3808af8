use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;

use crate::core::PriceProvider;
use crate::core::holding::AssetClass;
use crate::providers::util::{get_json, with_query};

/// Alpha Vantage `GLOBAL_QUOTE`. Needs an API key; without one every fetch
/// fails immediately so the next source is tried.
pub struct AlphaVantageProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: Option<String>, client: reqwest::Client) -> Self {
        AlphaVantageProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "Alpha Vantage"
    }

    fn supports(&self, asset_class: AssetClass) -> bool {
        asset_class != AssetClass::Crypto
    }

    async fn fetch_price(&self, symbol: &str) -> Result<f64> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Alpha Vantage API key not configured"))?;
        let url = with_query(
            &format!("{}/query", self.base_url),
            &[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", api_key),
            ],
        )?;
        let data: GlobalQuoteResponse = get_json(&self.client, &url, symbol).await?;

        let price = data
            .global_quote
            .and_then(|q| q.price)
            .ok_or_else(|| anyhow!("No quote returned for symbol: {}", symbol))?;
        price
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Invalid price '{price}' for symbol: {symbol}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::util::http_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> reqwest::Client {
        http_client(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_global_quote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "GLOBAL_QUOTE"))
            .and(query_param("symbol", "IBM"))
            .and(query_param("apikey", "key123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Global Quote": {"01. symbol": "IBM", "05. price": "172.5400"}}"#,
            ))
            .mount(&server)
            .await;

        let provider =
            AlphaVantageProvider::new(&server.uri(), Some("key123".to_string()), client());
        assert_eq!(provider.fetch_price("IBM").await.unwrap(), 172.54);
    }

    #[tokio::test]
    async fn test_missing_key_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = AlphaVantageProvider::new(&server.uri(), Some(String::new()), client());
        let result = provider.fetch_price("IBM").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Alpha Vantage API key not configured"
        );
    }

    #[tokio::test]
    async fn test_rate_limit_note_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"Note": "Thank you for using Alpha Vantage!"}"#),
            )
            .mount(&server)
            .await;

        let provider = AlphaVantageProvider::new(&server.uri(), Some("k".to_string()), client());
        let result = provider.fetch_price("IBM").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No quote returned for symbol: IBM"
        );
    }
}
