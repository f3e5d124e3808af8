//! Pricing abstractions and core types

use crate::core::currency::Currency;
use crate::core::holding::AssetClass;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single source of market quotes.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this source should be consulted for the given asset class.
    fn supports(&self, asset_class: AssetClass) -> bool;

    /// Latest price for `symbol`, in whatever currency the source quotes it.
    async fn fetch_price(&self, symbol: &str) -> Result<f64>;
}

/// A price paired with the currency it is denominated in.
///
/// A price of `0.0` means every source failed and the price is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativePrice {
    pub price: f64,
    pub currency: Currency,
}

impl NativePrice {
    pub fn unknown(currency: Currency) -> Self {
        Self {
            price: 0.0,
            currency,
        }
    }

    pub fn is_known(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}
