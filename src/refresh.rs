//! Periodic re-pricing of stale holdings.

use crate::core::{Clock, Holding};
use crate::pricing::PriceService;
use crate::store::HoldingStore;
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub checked: usize,
    pub updated: usize,
    /// Holdings skipped because their price is recent enough.
    pub fresh: usize,
    pub failed: usize,
}

/// Re-fetches prices for holdings whose last refresh is older than
/// `stale_after`.
///
/// A failed fetch never replaces a known price with zero; the holding keeps
/// its previous price and timestamp and is retried next cycle.
pub struct PriceRefresher {
    store: Arc<dyn HoldingStore>,
    prices: Arc<PriceService>,
    clock: Arc<dyn Clock>,
    stale_after: chrono::Duration,
    interval: Duration,
}

impl PriceRefresher {
    pub fn new(
        store: Arc<dyn HoldingStore>,
        prices: Arc<PriceService>,
        clock: Arc<dyn Clock>,
        stale_after: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            prices,
            clock,
            stale_after: chrono::Duration::from_std(stale_after)
                .unwrap_or(chrono::Duration::MAX),
            interval,
        }
    }

    /// Runs one pass over every stored holding. Records that cannot be
    /// read are logged and counted as failed.
    pub async fn run_cycle(&self) -> Result<RefreshReport> {
        let scan = self.store.scan_all().await?;
        info!("Updating prices for {} holdings", scan.holdings.len());

        let mut report = RefreshReport::default();
        for bad in &scan.corrupt {
            warn!("Skipping unreadable holding {}: {:#}", bad.key, bad.error);
            report.checked += 1;
            report.failed += 1;
        }

        for holding in scan.holdings {
            report.checked += 1;
            if !holding.is_price_stale(self.clock.now(), self.stale_after) {
                report.fresh += 1;
                continue;
            }

            match self.refresh_holding(&holding).await {
                Ok(true) => report.updated += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    warn!(
                        "Failed to refresh holding {} ({}): {:#}",
                        holding.id, holding.ticker, e
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            "Price update completed: {} updated, {} fresh, {} failed",
            report.updated, report.fresh, report.failed
        );
        Ok(report)
    }

    /// Returns whether a new price was stored.
    async fn refresh_holding(&self, holding: &Holding) -> Result<bool> {
        debug!(
            "Updating price for {} ({})",
            holding.ticker, holding.price_currency
        );
        let quote = self
            .prices
            .get_native_price(holding.asset_class, &holding.ticker)
            .await;
        if !quote.is_known() {
            warn!("Could not fetch price for {}", holding.ticker);
            return Ok(false);
        }

        // Re-read so edits made while fetching are not clobbered
        let Some(mut current) = self.store.get(&holding.owner, holding.id).await? else {
            debug!("Holding {} was removed during refresh", holding.id);
            return Ok(false);
        };
        current.native_current_price = quote.price;
        current.price_currency = quote.currency;
        current.last_price_refresh = Some(self.clock.now());
        self.store.update(&current).await?;

        info!(
            "Updated {}: {} {}",
            current.ticker, quote.price, quote.currency
        );
        Ok(true)
    }

    /// Runs cycles back to back, sleeping `interval` after each, until
    /// `shutdown` resolves. A cycle in progress always runs to completion.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            "Price refresher started (every {}s)",
            self.interval.as_secs()
        );
        loop {
            if let Err(e) = self.run_cycle().await {
                error!("Price refresh cycle failed: {:#}", e);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    info!("Price refresher stopping");
                    break;
                }
            }
        }
    }
}
