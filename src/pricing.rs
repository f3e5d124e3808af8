//! Native-currency market prices from an ordered list of sources.

use crate::core::currency::classify_native_currency;
use crate::core::holding::AssetClass;
use crate::core::{NativePrice, PriceProvider};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct PriceService {
    sources: Vec<Box<dyn PriceProvider>>,
    pause: Duration,
}

impl PriceService {
    /// `pause` is slept between a failed source and the next attempt.
    pub fn new(sources: Vec<Box<dyn PriceProvider>>, pause: Duration) -> Self {
        Self { sources, pause }
    }

    /// Names of the sources consulted for `asset_class`, in order.
    pub fn sources_for(&self, asset_class: AssetClass) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| s.supports(asset_class))
            .map(|s| s.name())
            .collect()
    }

    /// Fetches the current price of `ticker` in its native currency.
    ///
    /// Never fails: when no source produces a positive price the result has a
    /// price of `0.0`, which callers must treat as unknown.
    pub async fn get_native_price(&self, asset_class: AssetClass, ticker: &str) -> NativePrice {
        let currency = classify_native_currency(asset_class, ticker);
        let candidates = self.sources.iter().filter(|s| s.supports(asset_class));

        for (attempt, source) in candidates.enumerate() {
            if attempt > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            debug!("Trying {} for {}", source.name(), ticker);
            match source.fetch_price(ticker).await {
                Ok(price) if price.is_finite() && price > 0.0 => {
                    info!(
                        "Got price for {} from {}: {:.2} {}",
                        ticker,
                        source.name(),
                        price,
                        currency
                    );
                    return NativePrice { price, currency };
                }
                Ok(price) => {
                    debug!(source = source.name(), price, "Ignoring non-positive price");
                }
                Err(e) => {
                    debug!(source = source.name(), error = %e, "Price source failed");
                }
            }
        }

        warn!("All price sources failed for {}", ticker);
        NativePrice::unknown(currency)
    }
}
