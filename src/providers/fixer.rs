use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::core::CurrencyRateProvider;
use crate::providers::util::{get_json, with_query};

/// Fixer.io latest rates. Needs an access key.
pub struct FixerProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl FixerProvider {
    pub fn new(base_url: &str, api_key: Option<String>, client: reqwest::Client) -> Self {
        FixerProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FixerResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[async_trait]
impl CurrencyRateProvider for FixerProvider {
    fn name(&self) -> &str {
        "Fixer"
    }

    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Fixer API key not configured"))?;
        let pair = format!("{from}/{to}");
        let url = with_query(
            &format!("{}/api/latest", self.base_url),
            &[("access_key", api_key), ("base", from), ("symbols", to)],
        )?;
        let data: FixerResponse = get_json(&self.client, &url, &pair).await?;

        if !data.success {
            return Err(anyhow!("Fixer reported failure for currency pair: {}", pair));
        }
        data.rates
            .get(to)
            .copied()
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", pair))
    }
}
