//! Holding records and their write-time validation.

use crate::core::currency::{Currency, classify_native_currency};
use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Category label for holdings without an assigned category.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Stock,
    Crypto,
    #[serde(alias = "Mutual Fund")]
    MutualFund,
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AssetClass::Stock => "Stock",
                AssetClass::Crypto => "Crypto",
                AssetClass::MutualFund => "Mutual Fund",
            }
        )
    }
}

impl FromStr for AssetClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" => Ok(AssetClass::Stock),
            "crypto" => Ok(AssetClass::Crypto),
            "mutual fund" | "mutualfund" | "mutual-fund" | "mf" => Ok(AssetClass::MutualFund),
            _ => Err(anyhow!("Invalid asset class: {}", s)),
        }
    }
}

/// User-assigned confidence label. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvictionTier {
    High,
    Medium,
    Low,
}

impl Display for ConvictionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ConvictionTier::High => "High",
                ConvictionTier::Medium => "Medium",
                ConvictionTier::Low => "Low",
            }
        )
    }
}

impl FromStr for ConvictionTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(ConvictionTier::High),
            "Medium" => Ok(ConvictionTier::Medium),
            "Low" => Ok(ConvictionTier::Low),
            _ => Err(anyhow!(
                "Invalid conviction tier: '{}' (expected High, Medium or Low)",
                s
            )),
        }
    }
}

/// A single tracked position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: u64,
    pub owner: String,
    pub asset_class: AssetClass,
    pub ticker: String,
    pub name: String,
    pub units: f64,
    /// Average purchase price, denominated in `buy_currency`.
    pub native_buy_price: f64,
    pub buy_currency: Currency,
    /// Last fetched market price, denominated in `price_currency`.
    pub native_current_price: f64,
    pub price_currency: Currency,
    pub conviction: ConvictionTier,
    #[serde(default)]
    pub thesis: String,
    #[serde(default)]
    pub category: Option<String>,
    pub purchase_date: NaiveDate,
    /// Time of the last successful price fetch, `None` if there never was one.
    #[serde(default)]
    pub last_price_refresh: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    /// Builds an unsaved holding (id 0) from creation input.
    ///
    /// The buy currency defaults to the asset's native quote currency. The
    /// current price starts unknown until a quote is fetched.
    pub fn from_new(owner: &str, new: NewHolding, now: DateTime<Utc>) -> Result<Self> {
        let price_currency = classify_native_currency(new.asset_class, &new.ticker);
        let holding = Holding {
            id: 0,
            owner: owner.to_string(),
            asset_class: new.asset_class,
            ticker: new.ticker.trim().to_string(),
            name: new.name,
            units: new.units,
            native_buy_price: new.native_buy_price,
            buy_currency: new.buy_currency.unwrap_or(price_currency),
            native_current_price: 0.0,
            price_currency,
            conviction: new.conviction,
            thesis: new.thesis,
            category: normalize_category(new.category),
            purchase_date: new.purchase_date,
            last_price_refresh: None,
            created_at: now,
            updated_at: now,
        };
        holding.validate()?;
        Ok(holding)
    }

    /// Rejects records that would make valuation meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            bail!("Ticker must not be empty");
        }
        if !self.units.is_finite() || self.units <= 0.0 {
            bail!(
                "Units must be a positive number for {}: got {}",
                self.ticker,
                self.units
            );
        }
        if !self.native_buy_price.is_finite() || self.native_buy_price < 0.0 {
            bail!(
                "Buy price must be zero or more for {}: got {}",
                self.ticker,
                self.native_buy_price
            );
        }
        if !self.native_current_price.is_finite() || self.native_current_price < 0.0 {
            bail!(
                "Current price must be zero or more for {}: got {}",
                self.ticker,
                self.native_current_price
            );
        }
        Ok(())
    }

    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }

    /// Whether the price was last refreshed more than `max_age` ago (or never).
    pub fn is_price_stale(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        match self.last_price_refresh {
            Some(at) => now - at > max_age,
            None => true,
        }
    }
}

/// Input for creating a holding.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewHolding {
    pub asset_class: AssetClass,
    pub ticker: String,
    pub name: String,
    pub units: f64,
    pub native_buy_price: f64,
    /// Overrides the derived buy currency, e.g. crypto bought with INR.
    #[serde(default)]
    pub buy_currency: Option<Currency>,
    pub conviction: ConvictionTier,
    #[serde(default)]
    pub thesis: String,
    #[serde(default)]
    pub category: Option<String>,
    pub purchase_date: NaiveDate,
}

/// Partial update of a holding. Prices fetched from the market are never
/// patched through here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HoldingUpdate {
    pub units: Option<f64>,
    pub native_buy_price: Option<f64>,
    pub buy_currency: Option<Currency>,
    pub conviction: Option<ConvictionTier>,
    pub thesis: Option<String>,
    /// An empty string clears the category.
    pub category: Option<String>,
}

impl HoldingUpdate {
    pub fn is_empty(&self) -> bool {
        self.units.is_none()
            && self.native_buy_price.is_none()
            && self.buy_currency.is_none()
            && self.conviction.is_none()
            && self.thesis.is_none()
            && self.category.is_none()
    }

    /// Applies the patch to a copy of `holding` and validates the result.
    pub fn apply(self, holding: &Holding, now: DateTime<Utc>) -> Result<Holding> {
        let mut updated = holding.clone();
        if let Some(units) = self.units {
            updated.units = units;
        }
        if let Some(price) = self.native_buy_price {
            updated.native_buy_price = price;
        }
        if let Some(currency) = self.buy_currency {
            updated.buy_currency = currency;
        }
        if let Some(conviction) = self.conviction {
            updated.conviction = conviction;
        }
        if let Some(thesis) = self.thesis {
            updated.thesis = thesis;
        }
        if let Some(category) = self.category {
            updated.category = normalize_category(Some(category));
        }
        updated.updated_at = now;
        updated.validate()?;
        Ok(updated)
    }
}

fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn new_holding(asset_class: AssetClass, ticker: &str) -> NewHolding {
        NewHolding {
            asset_class,
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            units: 10.0,
            native_buy_price: 100.0,
            buy_currency: None,
            conviction: ConvictionTier::High,
            thesis: String::new(),
            category: None,
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    #[test]
    fn test_conviction_parse_is_exact() {
        assert_eq!(
            "High".parse::<ConvictionTier>().unwrap(),
            ConvictionTier::High
        );
        assert_eq!(
            "Medium".parse::<ConvictionTier>().unwrap(),
            ConvictionTier::Medium
        );
        assert_eq!("Low".parse::<ConvictionTier>().unwrap(), ConvictionTier::Low);
        assert!("high".parse::<ConvictionTier>().is_err());
        assert!("VeryHigh".parse::<ConvictionTier>().is_err());
    }

    #[test]
    fn test_unknown_tier_fails_deserialization() {
        let json = r#""Extreme""#;
        assert!(serde_json::from_str::<ConvictionTier>(json).is_err());
    }

    #[test]
    fn test_asset_class_parse() {
        assert_eq!(
            "Mutual Fund".parse::<AssetClass>().unwrap(),
            AssetClass::MutualFund
        );
        assert_eq!("crypto".parse::<AssetClass>().unwrap(), AssetClass::Crypto);
        assert!("bond".parse::<AssetClass>().is_err());
        let parsed: AssetClass = serde_json::from_str(r#""Mutual Fund""#).unwrap();
        assert_eq!(parsed, AssetClass::MutualFund);
    }

    #[test]
    fn test_from_new_derives_currencies() {
        let us = Holding::from_new("alice", new_holding(AssetClass::Stock, "AAPL"), now()).unwrap();
        assert_eq!(us.buy_currency, Currency::Usd);
        assert_eq!(us.price_currency, Currency::Usd);
        assert_eq!(us.native_current_price, 0.0);
        assert!(us.last_price_refresh.is_none());

        let indian =
            Holding::from_new("alice", new_holding(AssetClass::Stock, "INFY.NS"), now()).unwrap();
        assert_eq!(indian.buy_currency, Currency::Inr);
        assert_eq!(indian.price_currency, Currency::Inr);

        let mut crypto = new_holding(AssetClass::Crypto, "BTC-USD");
        crypto.buy_currency = Some(Currency::Inr);
        let crypto = Holding::from_new("alice", crypto, now()).unwrap();
        assert_eq!(crypto.buy_currency, Currency::Inr);
        assert_eq!(crypto.price_currency, Currency::Usd);
    }

    #[test]
    fn test_from_new_rejects_invalid_positions() {
        let mut negative = new_holding(AssetClass::Stock, "AAPL");
        negative.units = -1.0;
        assert!(Holding::from_new("alice", negative, now()).is_err());

        let mut zero = new_holding(AssetClass::Stock, "AAPL");
        zero.units = 0.0;
        assert!(Holding::from_new("alice", zero, now()).is_err());

        let mut nan_price = new_holding(AssetClass::Stock, "AAPL");
        nan_price.native_buy_price = f64::NAN;
        assert!(Holding::from_new("alice", nan_price, now()).is_err());

        let blank = new_holding(AssetClass::Stock, "  ");
        assert!(Holding::from_new("alice", blank, now()).is_err());
    }

    #[test]
    fn test_update_applies_and_validates() {
        let holding =
            Holding::from_new("alice", new_holding(AssetClass::Stock, "AAPL"), now()).unwrap();
        let later = now() + chrono::Duration::hours(1);

        let update = HoldingUpdate {
            units: Some(12.0),
            category: Some("US Tech".to_string()),
            ..Default::default()
        };
        let updated = update.apply(&holding, later).unwrap();
        assert_eq!(updated.units, 12.0);
        assert_eq!(updated.category.as_deref(), Some("US Tech"));
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.native_buy_price, holding.native_buy_price);

        let clear = HoldingUpdate {
            category: Some(String::new()),
            ..Default::default()
        };
        assert!(clear.apply(&updated, later).unwrap().category.is_none());

        let bad = HoldingUpdate {
            units: Some(-3.0),
            ..Default::default()
        };
        assert!(bad.apply(&holding, later).is_err());
    }

    #[test]
    fn test_price_staleness() {
        let mut holding =
            Holding::from_new("alice", new_holding(AssetClass::Stock, "AAPL"), now()).unwrap();
        let window = chrono::Duration::minutes(15);
        assert!(holding.is_price_stale(now(), window));

        holding.last_price_refresh = Some(now());
        assert!(!holding.is_price_stale(now() + chrono::Duration::minutes(10), window));
        assert!(!holding.is_price_stale(now() + chrono::Duration::minutes(15), window));
        assert!(holding.is_price_stale(now() + chrono::Duration::minutes(16), window));
    }
}
