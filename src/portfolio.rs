//! Holding create/update/delete flows and the read paths feeding the
//! valuation engine.

use crate::core::allocation::{AllocationGoal, AllocationReport, allocation_analysis};
use crate::core::valuation::{Metrics, PortfolioSnapshot, aggregate, compute_metrics};
use crate::core::{Clock, Holding, HoldingUpdate, NewHolding};
use crate::pricing::PriceService;
use crate::rates::ExchangeRateService;
use crate::store::HoldingStore;
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::{info, warn};

/// A holding together with its valuation at the current rate.
#[derive(Debug, Clone)]
pub struct HoldingView {
    pub holding: Holding,
    pub metrics: Metrics,
}

pub struct HoldingService {
    store: Arc<dyn HoldingStore>,
    prices: Arc<PriceService>,
    rates: Arc<ExchangeRateService>,
    clock: Arc<dyn Clock>,
}

impl HoldingService {
    pub fn new(
        store: Arc<dyn HoldingStore>,
        prices: Arc<PriceService>,
        rates: Arc<ExchangeRateService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            prices,
            rates,
            clock,
        }
    }

    /// Validates and saves a new holding, populating its current price.
    ///
    /// A failed price lookup does not block creation; the holding is saved
    /// with an unknown price and picked up by the next refresh cycle.
    pub async fn create(&self, owner: &str, new: NewHolding) -> Result<Holding> {
        let now = self.clock.now();
        let mut holding = Holding::from_new(owner, new, now)?;

        let quote = self
            .prices
            .get_native_price(holding.asset_class, &holding.ticker)
            .await;
        if quote.is_known() {
            holding.native_current_price = quote.price;
            holding.price_currency = quote.currency;
            holding.last_price_refresh = Some(now);
        } else {
            warn!(
                "Saving {} without a current price, it will be retried on refresh",
                holding.ticker
            );
        }

        let saved = self.store.insert(holding).await?;
        info!(
            "Created holding {} for {} ({} {})",
            saved.id, saved.ticker, saved.native_current_price, saved.price_currency
        );
        Ok(saved)
    }

    pub async fn update(&self, owner: &str, id: u64, update: HoldingUpdate) -> Result<Holding> {
        let existing = self
            .store
            .get(owner, id)
            .await?
            .with_context(|| format!("Holding {id} not found"))?;
        if update.is_empty() {
            return Ok(existing);
        }

        let updated = update.apply(&existing, self.clock.now())?;
        self.store.update(&updated).await?;
        info!("Updated holding {} ({})", id, updated.ticker);
        Ok(updated)
    }

    pub async fn delete(&self, owner: &str, id: u64) -> Result<()> {
        if !self.store.delete(owner, id).await? {
            bail!("Holding {} not found", id);
        }
        info!("Deleted holding {}", id);
        Ok(())
    }

    pub async fn metrics_for(&self, owner: &str) -> Result<Vec<HoldingView>> {
        let holdings = self.store.list(owner).await?;
        let rate = self.rates.get_rate().await;
        Ok(holdings
            .into_iter()
            .map(|holding| {
                let metrics = compute_metrics(&holding, rate);
                HoldingView { holding, metrics }
            })
            .collect())
    }

    pub async fn stats(&self, owner: &str) -> Result<PortfolioSnapshot> {
        let holdings = self.store.list(owner).await?;
        let rate = self.rates.get_rate().await;
        Ok(aggregate(&holdings, rate))
    }

    pub async fn allocation(
        &self,
        owner: &str,
        goals: &[AllocationGoal],
    ) -> Result<AllocationReport> {
        let holdings = self.store.list(owner).await?;
        let rate = self.rates.get_rate().await;
        Ok(allocation_analysis(&holdings, goals, rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ExchangeRateConfig;
    use crate::core::holding::{AssetClass, ConvictionTier};
    use crate::core::{Currency, ManualClock};
    use crate::pricing::tests::TablePriceSource;
    use crate::store::MemoryHoldingStore;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::time::Duration;

    fn service(prices: &[(&str, f64)]) -> (HoldingService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        ));
        let source = TablePriceSource::new(
            "table",
            &[AssetClass::Stock, AssetClass::Crypto, AssetClass::MutualFund],
            prices,
        );
        let prices = Arc::new(PriceService::new(vec![Box::new(source)], Duration::ZERO));
        // No rate sources: every lookup yields the 83.0 fallback
        let rates = Arc::new(ExchangeRateService::new(
            Vec::new(),
            clock.clone(),
            &ExchangeRateConfig::default(),
        ));
        let service = HoldingService::new(
            Arc::new(MemoryHoldingStore::new()),
            prices,
            rates,
            clock.clone(),
        );
        (service, clock)
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
            thesis: String::new(),
            category: None,
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_populates_price() {
        let (service, clock) = service(&[("AAPL", 120.0)]);
        let h = service
            .create("alice", new_holding(AssetClass::Stock, "AAPL", 10.0, 100.0))
            .await
            .unwrap();

        assert_eq!(h.id, 1);
        assert_eq!(h.native_current_price, 120.0);
        assert_eq!(h.price_currency, Currency::Usd);
        assert_eq!(h.buy_currency, Currency::Usd);
        assert_eq!(h.last_price_refresh, Some(clock.now()));

        let views = service.metrics_for("alice").await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].metrics.invested_value_inr, 83000.0);
        assert_eq!(views[0].metrics.current_value_inr, 99600.0);
    }

    #[tokio::test]
    async fn test_create_without_price_leaves_it_unknown() {
        let (service, _) = service(&[]);
        let h = service
            .create("alice", new_holding(AssetClass::MutualFund, "INF200K01RJ1", 5.0, 40.0))
            .await
            .unwrap();
        assert_eq!(h.native_current_price, 0.0);
        assert_eq!(h.price_currency, Currency::Inr);
        assert!(h.last_price_refresh.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_units() {
        let (service, _) = service(&[("AAPL", 120.0)]);
        let result = service
            .create("alice", new_holding(AssetClass::Stock, "AAPL", -1.0, 100.0))
            .await;
        assert!(result.is_err());
        assert!(service.metrics_for("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (service, _) = service(&[("AAPL", 120.0)]);
        let h = service
            .create("alice", new_holding(AssetClass::Stock, "AAPL", 10.0, 100.0))
            .await
            .unwrap();

        let updated = service
            .update(
                "alice",
                h.id,
                HoldingUpdate {
                    conviction: Some(ConvictionTier::Low),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.conviction, ConvictionTier::Low);
        assert_eq!(updated.native_current_price, 120.0);

        assert!(service.update("bob", h.id, HoldingUpdate::default()).await.is_err());
        assert!(service.delete("bob", h.id).await.is_err());
        service.delete("alice", h.id).await.unwrap();
        assert!(service.metrics_for("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_and_allocation() {
        let (service, _) = service(&[("AAPL", 120.0), ("BTC-USD", 700.0)]);
        service
            .create("alice", new_holding(AssetClass::Stock, "AAPL", 10.0, 100.0))
            .await
            .unwrap();
        let mut crypto = new_holding(AssetClass::Crypto, "BTC-USD", 2.0, 50000.0);
        crypto.buy_currency = Some(Currency::Inr);
        crypto.category = Some("Crypto".to_string());
        crypto.conviction = ConvictionTier::Medium;
        service.create("alice", crypto).await.unwrap();

        let stats = service.stats("alice").await.unwrap();
        assert_eq!(stats.total_invested_inr, 183000.0);
        assert_eq!(stats.current_value_inr, 215800.0);
        assert_eq!(stats.conviction.high, 1);
        assert_eq!(stats.conviction.medium, 1);
        assert_eq!(stats.usd_inr_rate, 83.0);

        let goals = vec![AllocationGoal {
            category: "Crypto".to_string(),
            target_percent: 50.0,
        }];
        let report = service.allocation("alice", &goals).await.unwrap();
        assert_eq!(report.total_value_inr, 215800.0);
        assert_eq!(report.goals[0].actual_value_inr, 116200.0);

        assert_eq!(service.stats("bob").await.unwrap().total_holdings, 0);
    }
}
