use super::ui;
use crate::core::Currency;
use crate::core::currency::format_money;
use crate::core::holding::ConvictionTier;
use crate::core::valuation::PortfolioSnapshot;
use crate::portfolio::HoldingService;
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(service: &HoldingService, owner: &str) -> Result<()> {
    let pb = ui::new_spinner("Calculating portfolio...");
    let result = service.stats(owner).await;
    pb.finish_and_clear();
    let snapshot = result?;

    println!(
        "\nPortfolio: {}\n",
        ui::style_text(owner, ui::StyleType::Title)
    );
    println!("{}", render_snapshot(&snapshot));
    ui::print_separator();
    Ok(())
}

pub fn render_snapshot(snapshot: &PortfolioSnapshot) -> String {
    let mut summary = ui::new_styled_table();
    summary.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
    summary.add_row(vec![
        Cell::new("Total Invested"),
        ui::money_cell(snapshot.total_invested_inr, Currency::Inr),
    ]);
    summary.add_row(vec![
        Cell::new("Current Value"),
        ui::money_cell(snapshot.current_value_inr, Currency::Inr),
    ]);
    summary.add_row(vec![
        Cell::new("Total P&L"),
        ui::pnl_cell(snapshot.total_pnl_inr),
    ]);
    summary.add_row(vec![
        Cell::new("Net Return"),
        ui::change_cell(snapshot.net_return_percent),
    ]);
    summary.add_row(vec![
        Cell::new("Holdings"),
        Cell::new(snapshot.total_holdings),
    ]);
    summary.add_row(vec![
        Cell::new("USD/INR"),
        Cell::new(format!("{:.4}", snapshot.usd_inr_rate)),
    ]);

    let mut conviction = ui::new_styled_table();
    conviction.set_header(vec![
        ui::header_cell("Conviction"),
        ui::header_cell("Holdings"),
    ]);
    for tier in [ConvictionTier::High, ConvictionTier::Medium, ConvictionTier::Low] {
        conviction.add_row(vec![
            Cell::new(tier),
            Cell::new(snapshot.conviction.get(tier)),
        ]);
    }

    let mut output = summary.to_string();
    output.push_str("\n\n");
    output.push_str(&conviction.to_string());

    if !snapshot.category_totals.is_empty() {
        let mut categories = ui::new_styled_table();
        categories.set_header(vec![
            ui::header_cell("Category"),
            ui::header_cell("Invested (₹)"),
            ui::header_cell("Value (₹)"),
            ui::header_cell("P&L (₹)"),
        ]);
        for (name, totals) in &snapshot.category_totals {
            categories.add_row(vec![
                Cell::new(name),
                ui::money_cell(totals.invested_inr, Currency::Inr),
                ui::money_cell(totals.current_value_inr, Currency::Inr),
                ui::pnl_cell(totals.current_value_inr - totals.invested_inr),
            ]);
        }
        output.push_str("\n\n");
        output.push_str(&categories.to_string());
    }

    output.push_str(&format!(
        "\n\nTotal Value ({}): {}",
        ui::style_text("INR", ui::StyleType::TotalLabel),
        ui::style_text(
            &format_money(snapshot.current_value_inr, Currency::Inr),
            ui::StyleType::TotalValue
        )
    ));
    output
}
