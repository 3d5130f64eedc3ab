use crate::models::{
    BudgetMetrics, BudgetRecord, ProfileType, Recommendation, RecommendationStatus,
};

const HOUSING_RATIO_CEILING: f64 = 0.30;
const STUDENT_SAVINGS_TARGET: f64 = 10.0;
const PROFESSIONAL_SAVINGS_TARGET: f64 = 20.0;

/// Derives all metrics fresh from the record. Ratios default to zero when
/// income is zero so no division by zero can occur downstream.
pub fn compute_metrics(record: &BudgetRecord) -> BudgetMetrics {
    let total_expenses = record.housing
        + record.food
        + record.transportation
        + record.entertainment
        + record.utilities
        + record.other;
    let remaining_budget = record.income - total_expenses;

    let (savings_rate, housing_ratio) = if record.income > 0.0 {
        (
            remaining_budget / record.income * 100.0,
            record.housing / record.income,
        )
    } else {
        (0.0, 0.0)
    };

    BudgetMetrics {
        income: record.income,
        total_expenses,
        remaining_budget,
        savings_rate,
        housing_ratio,
    }
}

fn savings_target(profile: ProfileType) -> f64 {
    match profile {
        ProfileType::Student => STUDENT_SAVINGS_TARGET,
        ProfileType::Professional => PROFESSIONAL_SAVINGS_TARGET,
    }
}

fn status_for(good: bool) -> RecommendationStatus {
    if good {
        RecommendationStatus::Good
    } else {
        RecommendationStatus::Warning
    }
}

/// Evaluates the three budget rules against the metrics. Always returns
/// exactly three recommendations in the order Housing, Savings Rate,
/// Emergency Fund; each rule is self-contained.
pub fn evaluate_budget(metrics: &BudgetMetrics, profile: ProfileType) -> Vec<Recommendation> {
    let housing = Recommendation {
        title: match profile {
            ProfileType::Student => "Housing Budget",
            ProfileType::Professional => "Housing Rule",
        },
        description: match profile {
            ProfileType::Student => {
                "Try to keep housing under 30% of your budget. Consider shared living to reduce costs."
            }
            ProfileType::Professional => {
                "Keep housing costs below 30% of gross income for financial stability."
            }
        },
        status: status_for(metrics.income > 0.0 && metrics.housing_ratio <= HOUSING_RATIO_CEILING),
        percentage: Some((metrics.housing_ratio * 100.0).round() as i64),
    };

    let savings = Recommendation {
        title: "Savings Rate",
        description: match profile {
            ProfileType::Student => "Even saving 10-15% as a student builds great habits!",
            ProfileType::Professional => "Aim for 20% savings rate to build wealth effectively.",
        },
        status: status_for(metrics.savings_rate >= savings_target(profile)),
        percentage: Some(metrics.savings_rate.round() as i64),
    };

    let emergency = Recommendation {
        title: "Emergency Fund",
        description: match profile {
            ProfileType::Student => "Start with $500, then build to 3 months of expenses.",
            ProfileType::Professional => "Maintain 3-6 months of expenses in emergency savings.",
        },
        status: status_for(metrics.remaining_budget > 0.0),
        percentage: None,
    };

    vec![housing, savings, emergency]
}
