//! Category allocation against user goals.
use crate::core::holding::Holding;
use crate::core::valuation::compute_metrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Target share of total portfolio value for a category.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AllocationGoal {
    pub category: String,
    pub target_percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryAllocation {
    pub value_inr: f64,
    pub percent: f64,
}

/// One goal paired with what the portfolio actually holds in that category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalComparison {
    pub category: String,
    pub target_percent: f64,
    pub actual_percent: f64,
    pub actual_value_inr: f64,
    /// `actual_percent - target_percent`; positive means overweight.
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationReport {
    pub total_value_inr: f64,
    /// Every category that has holdings, keyed by category name.
    pub actual: BTreeMap<String, CategoryAllocation>,
    /// Every goal, in the order given, including goals with no holdings.
    pub goals: Vec<GoalComparison>,
}

impl AllocationReport {
    /// Categories that hold value but have no goal.
    pub fn untargeted(&self) -> impl Iterator<Item = (&String, &CategoryAllocation)> {
        self.actual
            .iter()
            .filter(|(category, _)| !self.goals.iter().any(|g| &g.category == *category))
    }
}

/// Groups current INR value by category and compares it to the goals.
pub fn allocation_analysis(
    holdings: &[Holding],
    goals: &[AllocationGoal],
    usd_inr_rate: f64,
) -> AllocationReport {
    let mut values: BTreeMap<String, f64> = BTreeMap::new();
    for holding in holdings {
        let metrics = compute_metrics(holding, usd_inr_rate);
        *values
            .entry(holding.category_label().to_string())
            .or_default() += metrics.current_value_inr;
    }

    let total_value_inr: f64 = values.values().sum();
    let share = |value: f64| {
        if total_value_inr > 0.0 {
            value / total_value_inr * 100.0
        } else {
            0.0
        }
    };

    let actual: BTreeMap<String, CategoryAllocation> = values
        .into_iter()
        .map(|(category, value_inr)| {
            (
                category,
                CategoryAllocation {
                    value_inr,
                    percent: share(value_inr),
                },
            )
        })
        .collect();

    let goals = goals
        .iter()
        .map(|goal| {
            let held = actual.get(&goal.category).copied().unwrap_or_default();
            GoalComparison {
                category: goal.category.clone(),
                target_percent: goal.target_percent,
                actual_percent: held.percent,
                actual_value_inr: held.value_inr,
                difference: held.percent - goal.target_percent,
            }
        })
        .collect();

    AllocationReport {
        total_value_inr,
        actual,
        goals,
    }
}
