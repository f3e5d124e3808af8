pub mod alpha_vantage;
pub mod amfi_provider;
pub mod coingecko;
pub mod exchangerate_api;
pub mod fixer;
pub mod util;
pub mod yahoo_finance;

use crate::core::config::ProvidersConfig;
use crate::core::{CurrencyRateProvider, PriceProvider};

/// Rate sources in the order they should be tried.
pub fn default_rate_sources(
    config: &ProvidersConfig,
    client: &reqwest::Client,
) -> Vec<Box<dyn CurrencyRateProvider>> {
    vec![
        Box::new(yahoo_finance::YahooCurrencyProvider::new(
            &config.yahoo.base_url,
            client.clone(),
        )),
        Box::new(exchangerate_api::ExchangeRateApiProvider::new(
            &config.exchangerate_api.base_url,
            client.clone(),
        )),
        Box::new(fixer::FixerProvider::new(
            &config.fixer.base_url,
            config.fixer.api_key.clone(),
            client.clone(),
        )),
    ]
}

/// Price sources in the order they should be tried. Each source declares
/// which asset classes it serves.
pub fn default_price_sources(
    config: &ProvidersConfig,
    client: &reqwest::Client,
) -> Vec<Box<dyn PriceProvider>> {
    vec![
        Box::new(coingecko::CoinGeckoProvider::new(
            &config.coingecko.base_url,
            client.clone(),
        )),
        Box::new(amfi_provider::AmfiProvider::new(
            &config.amfi.base_url,
            client.clone(),
        )),
        Box::new(yahoo_finance::YahooChartProvider::new(
            &config.yahoo.base_url,
            client.clone(),
        )),
        Box::new(yahoo_finance::YahooSearchProvider::new(
            &config.yahoo.base_url,
            client.clone(),
        )),
        Box::new(alpha_vantage::AlphaVantageProvider::new(
            &config.alpha_vantage.base_url,
            config.alpha_vantage.api_key.clone(),
            client.clone(),
        )),
    ]
}
