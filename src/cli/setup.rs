use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# Configuration file for folio
#
# Holdings are stored per owner; pick any stable id.
owner: "default"

# Where holdings are persisted. Defaults to the platform data directory.
# data_path: "/home/me/.local/share/folio"

providers:
  yahoo:
    base_url: "https://query1.finance.yahoo.com"
  exchangerate_api:
    base_url: "https://api.exchangerate-api.com"
  fixer:
    base_url: "http://data.fixer.io"
    # api_key: "..."  (or set FIXER_API_KEY)
  coingecko:
    base_url: "https://api.coingecko.com"
  amfi:
    base_url: "https://mf.captnemo.in"
  alpha_vantage:
    base_url: "https://www.alphavantage.co"
    # api_key: "..."  (or set ALPHA_VANTAGE_API_KEY)

refresh:
  interval_secs: 900
  stale_after_secs: 900
  request_timeout_secs: 8
  source_pause_ms: 100

exchange_rate:
  ttl_secs: 3600
  fallback_rate: 83.0
  min_rate: 70.0
  max_rate: 100.0

# Target share of portfolio value per category, in percent.
allocation_goals:
  - category: "Equity"
    target_percent: 60.0
  - category: "Debt"
    target_percent: 30.0
  - category: "Crypto"
    target_percent: 10.0
"#;

/// Creates a default configuration file at the default location
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(path)
}

/// Creates a default configuration file at the specified path
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
