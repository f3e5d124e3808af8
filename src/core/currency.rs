//! Currency types, classification and conversion helpers.

use crate::core::holding::AssetClass;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Ticker suffixes of instruments listed on Indian exchanges (NSE, BSE).
const INDIAN_EXCHANGE_SUFFIXES: [&str; 2] = [".NS", ".BO"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Inr,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Inr => "INR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Inr => "₹",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "INR" => Ok(Currency::Inr),
            _ => Err(anyhow!("Unsupported currency: {}", s)),
        }
    }
}

/// A single source of exchange rates, e.g. one HTTP API.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Units of `to` per one unit of `from`.
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}

/// Returns true when the ticker carries an Indian exchange suffix.
pub fn is_indian_listing(ticker: &str) -> bool {
    let ticker = ticker.trim().to_uppercase();
    INDIAN_EXCHANGE_SUFFIXES
        .iter()
        .any(|suffix| ticker.ends_with(suffix))
}

/// Decides the currency an asset is quoted in.
///
/// Crypto is always quoted in USD. Otherwise an Indian exchange suffix wins,
/// remaining stocks are treated as US listings and everything else (mutual
/// funds) is INR.
pub fn classify_native_currency(asset_class: AssetClass, ticker: &str) -> Currency {
    match asset_class {
        AssetClass::Crypto => Currency::Usd,
        _ if is_indian_listing(ticker) => Currency::Inr,
        AssetClass::Stock => Currency::Usd,
        AssetClass::MutualFund => Currency::Inr,
    }
}

/// Converts an amount denominated in `currency` into INR.
pub fn to_inr(amount: f64, currency: Currency, usd_inr_rate: f64) -> f64 {
    match currency {
        Currency::Usd => amount * usd_inr_rate,
        Currency::Inr => amount,
    }
}

/// Formats a money value as `$1,234.56` / `₹1,234.56`.
pub fn format_money(amount: f64, currency: Currency) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // "-0.00" reads badly, only show the sign for amounts that survive rounding
    let sign = if amount < 0.0 && fixed != "0.00" {
        "-"
    } else {
        ""
    };
    format!("{sign}{}{grouped}.{fraction}", currency.symbol())
}
