use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::core::PriceProvider;
use crate::core::holding::AssetClass;
use crate::providers::util::get_json;

/// Mutual fund NAVs published by AMFI, looked up by ISIN.
pub struct AmfiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl AmfiProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        AmfiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AmfiResponse {
    nav: f64,
    #[serde(default)]
    date: Option<String>,
}

/// ISINs are 12 characters: a two letter country code then alphanumerics.
fn is_isin(identifier: &str) -> bool {
    identifier.len() == 12
        && identifier.chars().take(2).all(|c| c.is_ascii_uppercase())
        && identifier.chars().all(|c| c.is_ascii_alphanumeric())
}

#[async_trait]
impl PriceProvider for AmfiProvider {
    fn name(&self) -> &str {
        "AMFI"
    }

    fn supports(&self, asset_class: AssetClass) -> bool {
        asset_class == AssetClass::MutualFund
    }

    async fn fetch_price(&self, identifier: &str) -> Result<f64> {
        if !is_isin(identifier) {
            return Err(anyhow!("Not an ISIN: {}", identifier));
        }

        let url = format!("{}/nav/{}", self.base_url, identifier);
        let response: AmfiResponse = get_json(&self.client, &url, identifier).await?;
        debug!(
            "Fetched NAV for ISIN {}: {} ({})",
            identifier,
            response.nav,
            response.date.as_deref().unwrap_or("undated")
        );
        Ok(response.nav)
    }
}
