//! USD→INR exchange rate with a time-boxed cache and ordered fallback sources.

use crate::core::config::ExchangeRateConfig;
use crate::core::{Clock, CurrencyRateProvider};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// A rate and the moment it was fetched. Always replaced as one value so
/// readers never see a rate paired with another rate's timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedRate {
    pub rate: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Supplies the current USD→INR rate.
///
/// Constructed once at startup and shared by handle. A cached rate younger
/// than the TTL is returned as is; otherwise the sources are tried in order
/// and the first rate inside the sanity bounds wins. When every source fails
/// the last known rate is returned, or the configured fallback if there has
/// never been one.
pub struct ExchangeRateService {
    sources: Vec<Box<dyn CurrencyRateProvider>>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    fallback_rate: f64,
    min_rate: f64,
    max_rate: f64,
    cached: RwLock<Option<CachedRate>>,
    // Serializes refreshes so a burst of callers hits the sources once.
    refreshing: Mutex<()>,
}

impl ExchangeRateService {
    pub fn new(
        sources: Vec<Box<dyn CurrencyRateProvider>>,
        clock: Arc<dyn Clock>,
        config: &ExchangeRateConfig,
    ) -> Self {
        Self {
            sources,
            clock,
            ttl: chrono::Duration::from_std(config.ttl()).unwrap_or(chrono::Duration::MAX),
            fallback_rate: config.fallback_rate,
            min_rate: config.min_rate,
            max_rate: config.max_rate,
            cached: RwLock::new(None),
            refreshing: Mutex::new(()),
        }
    }

    /// The cached rate regardless of age, if any fetch ever succeeded.
    pub async fn cached(&self) -> Option<CachedRate> {
        *self.cached.read().await
    }

    pub async fn get_rate(&self) -> f64 {
        if let Some(rate) = self.fresh_rate().await {
            return rate;
        }

        let _guard = self.refreshing.lock().await;
        // Another caller may have refreshed while we waited
        if let Some(rate) = self.fresh_rate().await {
            return rate;
        }

        if let Some(rate) = self.fetch_from_sources().await {
            let entry = CachedRate {
                rate,
                fetched_at: self.clock.now(),
            };
            *self.cached.write().await = Some(entry);
            info!("Updated USD/INR rate: {:.2}", rate);
            return rate;
        }

        match self.cached().await {
            Some(stale) => {
                warn!(
                    "All exchange rate sources failed, using last known rate {:.2} from {}",
                    stale.rate, stale.fetched_at
                );
                stale.rate
            }
            None => {
                warn!(
                    "All exchange rate sources failed, using fallback rate {:.2}",
                    self.fallback_rate
                );
                self.fallback_rate
            }
        }
    }

    async fn fresh_rate(&self) -> Option<f64> {
        let cached = self.cached().await?;
        let age = self.clock.now() - cached.fetched_at;
        if age < self.ttl {
            debug!("Exchange rate cache HIT (age {}s)", age.num_seconds());
            Some(cached.rate)
        } else {
            debug!("Exchange rate cache expired (age {}s)", age.num_seconds());
            None
        }
    }

    fn is_sane(&self, rate: f64) -> bool {
        rate.is_finite() && rate > self.min_rate && rate < self.max_rate
    }

    async fn fetch_from_sources(&self) -> Option<f64> {
        for source in &self.sources {
            match source.get_rate("USD", "INR").await {
                Ok(rate) if self.is_sane(rate) => {
                    debug!(source = source.name(), rate, "Exchange rate source succeeded");
                    return Some(rate);
                }
                Ok(rate) => {
                    warn!(
                        source = source.name(),
                        rate, "Rejected exchange rate outside {}..{}", self.min_rate, self.max_rate
                    );
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Exchange rate source failed");
                }
            }
        }
        None
    }
}
