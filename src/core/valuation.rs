//! Currency-aware valuation of holdings and portfolio-wide aggregation.
//!
//! All outputs are normalized to INR. Invested value is converted from the
//! holding's buy currency and current value from the currency the market
//! quote is denominated in; the two sides are converted independently.
use crate::core::currency::{Currency, format_money, to_inr};
use crate::core::holding::{ConvictionTier, Holding};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Per-holding valuation, all `*_inr` fields in INR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub invested_native: f64,
    pub invested_currency: Currency,
    pub current_native: f64,
    pub current_currency: Currency,
    pub invested_value_inr: f64,
    pub current_value_inr: f64,
    pub pnl_inr: f64,
    pub pnl_percent: f64,
    pub buy_price_display: String,
    pub current_price_display: String,
    /// The USD→INR rate applied, only when either side was in USD.
    pub usd_inr_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConvictionCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ConvictionCounts {
    pub fn record(&mut self, tier: ConvictionTier) {
        match tier {
            ConvictionTier::High => self.high += 1,
            ConvictionTier::Medium => self.medium += 1,
            ConvictionTier::Low => self.low += 1,
        }
    }

    pub fn get(&self, tier: ConvictionTier) -> usize {
        match tier {
            ConvictionTier::High => self.high,
            ConvictionTier::Medium => self.medium,
            ConvictionTier::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub invested_inr: f64,
    pub current_value_inr: f64,
}

/// Portfolio-wide sums at a point in time. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub total_invested_inr: f64,
    pub current_value_inr: f64,
    pub total_pnl_inr: f64,
    pub net_return_percent: f64,
    pub conviction: ConvictionCounts,
    pub total_holdings: usize,
    pub category_totals: BTreeMap<String, CategoryTotals>,
    pub usd_inr_rate: f64,
}

/// Non-finite results collapse to zero so one corrupt holding cannot poison
/// an aggregate.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Return in percent of `invested`, defined as 0 when nothing was invested.
pub fn percent_return(pnl: f64, invested: f64) -> f64 {
    if invested > 0.0 {
        finite_or_zero(pnl / invested * 100.0)
    } else {
        0.0
    }
}

/// Values a single holding at the given USD→INR rate.
pub fn compute_metrics(holding: &Holding, usd_inr_rate: f64) -> Metrics {
    let invested_native = finite_or_zero(holding.units * holding.native_buy_price);
    let current_native = finite_or_zero(holding.units * holding.native_current_price);

    let invested_value_inr =
        finite_or_zero(to_inr(invested_native, holding.buy_currency, usd_inr_rate));
    let current_value_inr =
        finite_or_zero(to_inr(current_native, holding.price_currency, usd_inr_rate));

    let pnl_inr = finite_or_zero(current_value_inr - invested_value_inr);
    let pnl_percent = percent_return(pnl_inr, invested_value_inr);

    let uses_usd =
        holding.buy_currency == Currency::Usd || holding.price_currency == Currency::Usd;

    Metrics {
        invested_native,
        invested_currency: holding.buy_currency,
        current_native,
        current_currency: holding.price_currency,
        invested_value_inr,
        current_value_inr,
        pnl_inr,
        pnl_percent,
        buy_price_display: format_money(holding.native_buy_price, holding.buy_currency),
        current_price_display: format_money(
            holding.native_current_price,
            holding.price_currency,
        ),
        usd_inr_rate: uses_usd.then_some(usd_inr_rate),
    }
}

/// Sums per-holding metrics into a [`PortfolioSnapshot`].
pub fn aggregate(holdings: &[Holding], usd_inr_rate: f64) -> PortfolioSnapshot {
    let mut total_invested_inr = 0.0;
    let mut current_value_inr = 0.0;
    let mut conviction = ConvictionCounts::default();
    let mut category_totals: BTreeMap<String, CategoryTotals> = BTreeMap::new();

    for holding in holdings {
        let metrics = compute_metrics(holding, usd_inr_rate);
        total_invested_inr += metrics.invested_value_inr;
        current_value_inr += metrics.current_value_inr;
        conviction.record(holding.conviction);

        let totals = category_totals
            .entry(holding.category_label().to_string())
            .or_default();
        totals.invested_inr += metrics.invested_value_inr;
        totals.current_value_inr += metrics.current_value_inr;
    }

    let total_pnl_inr = current_value_inr - total_invested_inr;
    let net_return_percent = percent_return(total_pnl_inr, total_invested_inr);
    debug!(
        holdings = holdings.len(),
        total_invested_inr, current_value_inr, net_return_percent, "Aggregated portfolio"
    );

    PortfolioSnapshot {
        total_invested_inr,
        current_value_inr,
        total_pnl_inr,
        net_return_percent,
        conviction,
        total_holdings: holdings.len(),
        category_totals,
        usd_inr_rate,
    }
}
