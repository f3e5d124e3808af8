use super::ui;
use crate::core::Currency;
use crate::core::currency::format_money;
use crate::rates::ExchangeRateService;
use anyhow::Result;

pub async fn run(rates: &ExchangeRateService) -> Result<()> {
    let pb = ui::new_spinner("Fetching USD/INR rate...");
    let rate = rates.get_rate().await;
    pb.finish_and_clear();

    println!(
        "1 USD = {}",
        ui::style_text(&format_money(rate, Currency::Inr), ui::StyleType::TotalValue)
    );
    match rates.cached().await {
        Some(cached) => println!(
            "{}",
            ui::style_text(
                &format!("Fetched at {}", cached.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")),
                ui::StyleType::Subtle
            )
        ),
        None => println!(
            "{}",
            ui::style_text(
                "All rate sources failed, showing the fallback rate",
                ui::StyleType::Error
            )
        ),
    }
    Ok(())
}
