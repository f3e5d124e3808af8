use super::ui;
use crate::core::Currency;
use crate::core::allocation::{AllocationGoal, AllocationReport};
use crate::core::currency::format_money;
use crate::portfolio::HoldingService;
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(service: &HoldingService, owner: &str, goals: &[AllocationGoal]) -> Result<()> {
    let pb = ui::new_spinner("Calculating allocation...");
    let result = service.allocation(owner, goals).await;
    pb.finish_and_clear();
    let report = result?;

    println!(
        "\nAllocation: {}\n",
        ui::style_text(owner, ui::StyleType::Title)
    );
    println!("{}", render_allocation(&report));
    if goals.is_empty() {
        println!(
            "\n{}",
            ui::style_text(
                "No allocation goals configured; add `allocation_goals` to the config file",
                ui::StyleType::Subtle
            )
        );
    }
    ui::print_separator();
    Ok(())
}

pub fn render_allocation(report: &AllocationReport) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell("Value (₹)"),
        ui::header_cell("Actual"),
        ui::header_cell("Target"),
        ui::header_cell("Difference"),
    ]);

    for goal in &report.goals {
        table.add_row(vec![
            Cell::new(&goal.category),
            ui::money_cell(goal.actual_value_inr, Currency::Inr),
            ui::percent_cell(goal.actual_percent),
            ui::percent_cell(goal.target_percent),
            ui::change_cell(goal.difference),
        ]);
    }
    for (category, actual) in report.untargeted() {
        table.add_row(vec![
            Cell::new(category),
            ui::money_cell(actual.value_inr, Currency::Inr),
            ui::percent_cell(actual.percent),
            Cell::new("-"),
            Cell::new("-"),
        ]);
    }

    format!(
        "{}\n\nTotal Value ({}): {}",
        table,
        ui::style_text("INR", ui::StyleType::TotalLabel),
        ui::style_text(
            &format_money(report.total_value_inr, Currency::Inr),
            ui::StyleType::TotalValue
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocation::allocation_analysis;
    use crate::core::holding::ConvictionTier;
    use crate::core::valuation::tests::holding;

    #[test]
    fn test_render_allocation_with_goals_and_untargeted() {
        let mut equity = holding(
            1.0,
            (1000.0, Currency::Inr),
            (750.0, Currency::Inr),
            ConvictionTier::High,
        );
        equity.category = Some("Equity".to_string());
        let mut gold = holding(
            1.0,
            (250.0, Currency::Inr),
            (250.0, Currency::Inr),
            ConvictionTier::Low,
        );
        gold.category = Some("Gold".to_string());

        let goals = vec![AllocationGoal {
            category: "Equity".to_string(),
            target_percent: 60.0,
        }];
        let output = render_allocation(&allocation_analysis(&[equity, gold], &goals, 83.0));

        assert!(output.contains("Equity"));
        assert!(output.contains("75.00%"));
        assert!(output.contains("60.00%"));
        assert!(output.contains("15.00%"));
        assert!(output.contains("Gold"));
        assert!(output.contains("25.00%"));
        assert!(output.contains("₹1,000.00"));
    }
}
