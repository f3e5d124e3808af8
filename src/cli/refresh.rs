use super::ui;
use crate::refresh::{PriceRefresher, RefreshReport};
use anyhow::Result;
use comfy_table::Cell;
use tracing::warn;

/// Runs a single refresh cycle and prints its outcome.
pub async fn run_once(refresher: &PriceRefresher) -> Result<()> {
    let pb = ui::new_spinner("Refreshing stale prices...");
    let result = refresher.run_cycle().await;
    pb.finish_and_clear();
    let report = result?;

    println!("{}", render_report(&report));
    Ok(())
}

/// Keeps refreshing on the configured interval until Ctrl-C.
pub async fn watch(refresher: &PriceRefresher) -> Result<()> {
    println!(
        "{}",
        ui::style_text("Watching prices, press Ctrl-C to stop", ui::StyleType::Subtle)
    );
    refresher
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(())
}

pub fn render_report(report: &RefreshReport) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Checked"),
        ui::header_cell("Updated"),
        ui::header_cell("Still Fresh"),
        ui::header_cell("Failed"),
    ]);
    table.add_row(vec![
        Cell::new(report.checked),
        Cell::new(report.updated),
        Cell::new(report.fresh),
        Cell::new(report.failed),
    ]);
    table.to_string()
}
