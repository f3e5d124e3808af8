use super::ui;
use crate::core::currency::format_money;
use crate::core::{Currency, Holding, HoldingUpdate, NewHolding};
use crate::portfolio::{HoldingService, HoldingView};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

pub async fn add(service: &HoldingService, owner: &str, new: NewHolding) -> Result<()> {
    let pb = ui::new_spinner("Fetching current price...");
    let result = service.create(owner, new).await;
    pb.finish_and_clear();
    let holding = result?;

    println!(
        "Added holding #{}: {} ({})",
        holding.id,
        ui::style_text(&holding.ticker, ui::StyleType::TotalLabel),
        holding.name
    );
    print_price_line(&holding);
    Ok(())
}

pub async fn update(
    service: &HoldingService,
    owner: &str,
    id: u64,
    update: HoldingUpdate,
) -> Result<()> {
    if update.is_empty() {
        println!("Nothing to update for holding #{id}");
        return Ok(());
    }
    let holding = service.update(owner, id, update).await?;
    println!(
        "Updated holding #{}: {} x {} @ {}",
        holding.id,
        holding.ticker,
        holding.units,
        format_money(holding.native_buy_price, holding.buy_currency)
    );
    Ok(())
}

pub async fn remove(service: &HoldingService, owner: &str, id: u64) -> Result<()> {
    service.delete(owner, id).await?;
    println!("Removed holding #{id}");
    Ok(())
}

pub async fn list(service: &HoldingService, owner: &str) -> Result<()> {
    let pb = ui::new_spinner("Loading holdings...");
    let result = service.metrics_for(owner).await;
    pb.finish_and_clear();
    let views = result?;

    if views.is_empty() {
        println!("No holdings yet. Add one with `folio add`.");
        return Ok(());
    }

    println!(
        "\nHoldings: {}\n",
        ui::style_text(owner, ui::StyleType::Title)
    );
    println!("{}", render_holdings(&views));
    if let Some(rate) = views.iter().find_map(|v| v.metrics.usd_inr_rate) {
        println!(
            "\n{}",
            ui::style_text(&format!("USD/INR rate used: {rate:.4}"), ui::StyleType::Subtle)
        );
    }
    Ok(())
}

fn print_price_line(holding: &Holding) {
    if holding.last_price_refresh.is_some() {
        println!(
            "Current price: {}",
            format_money(holding.native_current_price, holding.price_currency)
        );
    } else {
        println!(
            "{}",
            ui::style_text(
                "Current price unavailable, it will be retried on the next refresh",
                ui::StyleType::Error
            )
        );
    }
}

/// Per-holding metrics table.
pub fn render_holdings(views: &[HoldingView]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Ticker"),
        ui::header_cell("Class"),
        ui::header_cell("Units"),
        ui::header_cell("Buy Price"),
        ui::header_cell("Current Price"),
        ui::header_cell("Invested (₹)"),
        ui::header_cell("Value (₹)"),
        ui::header_cell("P&L (₹)"),
        ui::header_cell("Return"),
        ui::header_cell("Conviction"),
        ui::header_cell("Category"),
    ]);

    for HoldingView { holding, metrics } in views {
        let current_price = if holding.native_current_price > 0.0 {
            Cell::new(&metrics.current_price_display).set_alignment(CellAlignment::Right)
        } else {
            ui::na_cell()
        };

        table.add_row(vec![
            Cell::new(holding.id),
            Cell::new(&holding.ticker),
            Cell::new(holding.asset_class),
            Cell::new(format!("{:.4}", holding.units)).set_alignment(CellAlignment::Right),
            Cell::new(&metrics.buy_price_display).set_alignment(CellAlignment::Right),
            current_price,
            ui::money_cell(metrics.invested_value_inr, Currency::Inr),
            ui::money_cell(metrics.current_value_inr, Currency::Inr),
            ui::pnl_cell(metrics.pnl_inr),
            ui::change_cell(metrics.pnl_percent),
            Cell::new(holding.conviction),
            Cell::new(holding.category_label()),
        ]);
    }

    table.to_string()
}
