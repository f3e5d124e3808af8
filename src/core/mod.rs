//! Core business logic abstractions

pub mod allocation;
pub mod clock;
pub mod config;
pub mod currency;
pub mod holding;
pub mod log;
pub mod price;
pub mod valuation;

// Re-export main types for cleaner imports
pub use clock::{Clock, ManualClock, SystemClock};
pub use currency::{Currency, CurrencyRateProvider};
pub use holding::{AssetClass, ConvictionTier, Holding, HoldingUpdate, NewHolding};
pub use price::{NativePrice, PriceProvider};
