use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use folio::core::holding::{AssetClass, ConvictionTier};
use folio::core::log::init_logging;
use folio::core::{Currency, HoldingUpdate, NewHolding};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct AddArgs {
    /// Ticker, e.g. AAPL, INFY.NS, BTC-USD, or a fund ISIN
    ticker: String,
    /// Stock, Crypto or "Mutual Fund"
    #[arg(short, long)]
    asset_class: AssetClass,
    #[arg(short, long)]
    units: f64,
    /// Price paid per unit
    #[arg(short, long)]
    buy_price: f64,
    /// Currency the buy price is in; derived from the ticker when omitted
    #[arg(long)]
    buy_currency: Option<Currency>,
    /// High, Medium or Low
    #[arg(long, default_value = "Medium")]
    conviction: ConvictionTier,
    /// Display name; defaults to the ticker
    #[arg(short, long)]
    name: Option<String>,
    #[arg(long, default_value = "")]
    thesis: String,
    #[arg(long)]
    category: Option<String>,
    /// Purchase date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    purchase_date: Option<NaiveDate>,
}

impl From<AddArgs> for NewHolding {
    fn from(args: AddArgs) -> NewHolding {
        NewHolding {
            name: args.name.unwrap_or_else(|| args.ticker.clone()),
            asset_class: args.asset_class,
            ticker: args.ticker,
            units: args.units,
            native_buy_price: args.buy_price,
            buy_currency: args.buy_currency,
            conviction: args.conviction,
            thesis: args.thesis,
            category: args.category,
            purchase_date: args
                .purchase_date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
        }
    }
}

#[derive(Args)]
struct UpdateArgs {
    id: u64,
    #[arg(short, long)]
    units: Option<f64>,
    #[arg(short, long)]
    buy_price: Option<f64>,
    #[arg(long)]
    buy_currency: Option<Currency>,
    #[arg(long)]
    conviction: Option<ConvictionTier>,
    #[arg(long)]
    thesis: Option<String>,
    /// Pass an empty string to clear the category
    #[arg(long)]
    category: Option<String>,
}

impl From<Commands> for folio::AppCommand {
    fn from(cmd: Commands) -> folio::AppCommand {
        match cmd {
            Commands::Add(args) => folio::AppCommand::Add(args.into()),
            Commands::Update(args) => folio::AppCommand::Update {
                id: args.id,
                update: HoldingUpdate {
                    units: args.units,
                    native_buy_price: args.buy_price,
                    buy_currency: args.buy_currency,
                    conviction: args.conviction,
                    thesis: args.thesis,
                    category: args.category,
                },
            },
            Commands::Remove { id } => folio::AppCommand::Remove { id },
            Commands::Holdings => folio::AppCommand::Holdings,
            Commands::Stats => folio::AppCommand::Stats,
            Commands::Alloc => folio::AppCommand::Alloc,
            Commands::Rate => folio::AppCommand::Rate,
            Commands::Refresh => folio::AppCommand::Refresh,
            Commands::Watch => folio::AppCommand::Watch,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Add a holding
    Add(AddArgs),
    /// Edit a holding's units, buy price, conviction, thesis or category
    Update(UpdateArgs),
    /// Delete a holding
    Remove { id: u64 },
    /// List holdings with INR valuation
    Holdings,
    /// Display portfolio totals
    Stats,
    /// Compare category allocation against goals
    Alloc,
    /// Show the current USD/INR rate
    Rate,
    /// Refresh stale prices once
    Refresh,
    /// Refresh stale prices periodically until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => folio::cli::setup::setup_at_path(path),
            None => folio::cli::setup::setup(),
        },
        Some(cmd) => folio::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
