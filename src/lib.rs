pub mod cli;
pub mod core;
pub mod portfolio;
pub mod pricing;
pub mod providers;
pub mod rates;
pub mod refresh;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{Clock, HoldingUpdate, NewHolding, SystemClock};
use crate::portfolio::HoldingService;
use crate::pricing::PriceService;
use crate::rates::ExchangeRateService;
use crate::refresh::PriceRefresher;
use crate::store::{DiskHoldingStore, HoldingStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Add(NewHolding),
    Update { id: u64, update: HoldingUpdate },
    Remove { id: u64 },
    Holdings,
    Stats,
    Alloc,
    Rate,
    Refresh,
    Watch,
}

/// The wired-up services for one session.
pub struct App {
    pub config: AppConfig,
    pub holdings: HoldingService,
    pub rates: Arc<ExchangeRateService>,
    pub refresher: PriceRefresher,
}

impl App {
    /// Builds the app over the on-disk store at the configured data path.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let data_path = config.default_data_path()?;
        debug!("Opening holdings store at {}", data_path.display());
        let store = Arc::new(DiskHoldingStore::open(&data_path)?);
        Self::with_store(config, store, Arc::new(SystemClock))
    }

    pub fn with_store(
        config: AppConfig,
        store: Arc<dyn HoldingStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.refresh.validate()?;
        let client = providers::util::http_client(config.refresh.request_timeout())?;

        let rates = Arc::new(ExchangeRateService::new(
            providers::default_rate_sources(&config.providers, &client),
            Arc::clone(&clock),
            &config.exchange_rate,
        ));
        let prices = Arc::new(PriceService::new(
            providers::default_price_sources(&config.providers, &client),
            config.refresh.source_pause(),
        ));

        let holdings = HoldingService::new(
            Arc::clone(&store),
            Arc::clone(&prices),
            Arc::clone(&rates),
            Arc::clone(&clock),
        );
        let refresher = PriceRefresher::new(
            store,
            prices,
            clock,
            config.refresh.stale_after(),
            config.refresh.interval(),
        );

        Ok(Self {
            config,
            holdings,
            rates,
            refresher,
        })
    }

    pub async fn execute(&self, command: AppCommand) -> Result<()> {
        let owner = self.config.owner.as_str();
        match command {
            AppCommand::Add(new) => cli::holdings::add(&self.holdings, owner, new).await,
            AppCommand::Update { id, update } => {
                cli::holdings::update(&self.holdings, owner, id, update).await
            }
            AppCommand::Remove { id } => cli::holdings::remove(&self.holdings, owner, id).await,
            AppCommand::Holdings => cli::holdings::list(&self.holdings, owner).await,
            AppCommand::Stats => cli::stats::run(&self.holdings, owner).await,
            AppCommand::Alloc => {
                cli::alloc::run(&self.holdings, owner, &self.config.allocation_goals).await
            }
            AppCommand::Rate => cli::rate::run(&self.rates).await,
            AppCommand::Refresh => cli::refresh::run_once(&self.refresher).await,
            AppCommand::Watch => cli::refresh::watch(&self.refresher).await,
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Folio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    App::from_config(config)?.execute(command).await
}
