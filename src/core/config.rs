use crate::core::allocation::AllocationGoal;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

const FIXER_API_KEY_ENV: &str = "FIXER_API_KEY";
const ALPHA_VANTAGE_API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderEndpoint {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

// Keys are masked so a dumped config is safe to log.
impl std::fmt::Debug for ProviderEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEndpoint")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ProviderEndpoint {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProvidersConfig {
    pub yahoo: ProviderEndpoint,
    pub exchangerate_api: ProviderEndpoint,
    pub fixer: ProviderEndpoint,
    pub coingecko: ProviderEndpoint,
    pub amfi: ProviderEndpoint,
    pub alpha_vantage: ProviderEndpoint,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: ProviderEndpoint::new("https://query1.finance.yahoo.com"),
            exchangerate_api: ProviderEndpoint::new("https://api.exchangerate-api.com"),
            fixer: ProviderEndpoint::new("http://data.fixer.io"),
            coingecko: ProviderEndpoint::new("https://api.coingecko.com"),
            amfi: ProviderEndpoint::new("https://mf.captnemo.in"),
            alpha_vantage: ProviderEndpoint::new("https://www.alphavantage.co"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    pub stale_after_secs: u64,
    pub request_timeout_secs: u64,
    pub source_pause_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 15 * 60,
            stale_after_secs: 15 * 60,
            request_timeout_secs: 8,
            source_pause_ms: 100,
        }
    }
}

impl RefreshConfig {
    /// Rejects a zero interval or request timeout.
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            bail!("refresh.interval_secs must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("refresh.request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn source_pause(&self) -> Duration {
        Duration::from_millis(self.source_pause_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExchangeRateConfig {
    pub ttl_secs: u64,
    pub fallback_rate: f64,
    pub min_rate: f64,
    pub max_rate: f64,
}

impl Default for ExchangeRateConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60 * 60,
            fallback_rate: 83.0,
            min_rate: 70.0,
            max_rate: 100.0,
        }
    }
}

impl ExchangeRateConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_owner() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default)]
    pub data_path: Option<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub exchange_rate: ExchangeRateConfig,
    #[serde(default)]
    pub allocation_goals: Vec<AllocationGoal>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            data_path: None,
            providers: ProvidersConfig::default(),
            refresh: RefreshConfig::default(),
            exchange_rate: ExchangeRateConfig::default(),
            allocation_goals: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "folio", "folio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "folio", "folio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.apply_env_keys();
        config
            .refresh
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Fills API keys missing from the file from the environment.
    pub fn apply_env_keys(&mut self) {
        fill_from_env(&mut self.providers.fixer.api_key, FIXER_API_KEY_ENV);
        fill_from_env(
            &mut self.providers.alpha_vantage.api_key,
            ALPHA_VANTAGE_API_KEY_ENV,
        );
    }
}

fn fill_from_env(key: &mut Option<String>, var: &str) {
    if key.as_deref().is_none_or(str::is_empty) {
        *key = std::env::var(var).ok().filter(|v| !v.is_empty());
    }
}
