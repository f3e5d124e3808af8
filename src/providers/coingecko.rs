use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::PriceProvider;
use crate::core::holding::AssetClass;
use crate::providers::util::{get_json, with_query};

/// Yahoo-style crypto tickers mapped to CoinGecko coin ids.
const COIN_IDS: [(&str, &str); 14] = [
    ("BTC-USD", "bitcoin"),
    ("ETH-USD", "ethereum"),
    ("ADA-USD", "cardano"),
    ("DOT-USD", "polkadot"),
    ("MATIC-USD", "matic-network"),
    ("SOL-USD", "solana"),
    ("AVAX-USD", "avalanche-2"),
    ("LINK-USD", "chainlink"),
    ("UNI-USD", "uniswap"),
    ("ATOM-USD", "cosmos"),
    ("XRP-USD", "ripple"),
    ("LTC-USD", "litecoin"),
    ("BCH-USD", "bitcoin-cash"),
    ("DOGE-USD", "dogecoin"),
];

/// Resolves a ticker like `BTC-USD` to a CoinGecko id. Unknown tickers are
/// lower-cased with the `-usd` suffix dropped, so `bitcoin` passes through.
pub fn coin_id(ticker: &str) -> String {
    let upper = ticker.trim().to_uppercase();
    COIN_IDS
        .iter()
        .find(|(t, _)| *t == upper)
        .map(|(_, id)| id.to_string())
        .unwrap_or_else(|| {
            let lower = ticker.trim().to_lowercase();
            lower.strip_suffix("-usd").unwrap_or(lower.as_str()).to_string()
        })
}

/// USD crypto quotes from CoinGecko's simple price API.
pub struct CoinGeckoProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    fn supports(&self, asset_class: AssetClass) -> bool {
        asset_class == AssetClass::Crypto
    }

    #[instrument(
        name = "CoinGeckoFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<f64> {
        let id = coin_id(symbol);
        let url = with_query(
            &format!("{}/api/v3/simple/price", self.base_url),
            &[("ids", id.as_str()), ("vs_currencies", "usd")],
        )?;
        let data: HashMap<String, HashMap<String, f64>> =
            get_json(&self.client, &url, symbol).await?;
        debug!(coin = %id, "Received CoinGecko response");

        data.get(&id)
            .and_then(|quotes| quotes.get("usd"))
            .copied()
            .ok_or_else(|| anyhow!("No USD price found for coin: {}", id))
    }
}
