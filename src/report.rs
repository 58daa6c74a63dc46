//! Text rendering of results for display and for the commentary prompt.

use crate::comparison::RateTable;
use crate::household::HouseholdAssessment;
use crate::schema::{AppraisalResult, DiscountRate, Metric};

fn rate_metric(metric: &Metric) -> String {
    match metric {
        Metric::Value(v) => format!("{:.2}%", v * 100.0),
        other => other.to_string(),
    }
}

fn period_metric(metric: &Metric) -> String {
    match metric {
        Metric::Value(v) => format!("{:.2} periods", v),
        other => other.to_string(),
    }
}

/// Labelled metrics in display order.
pub fn render_metrics(result: &AppraisalResult) -> Vec<(&'static str, String)> {
    vec![
        ("Net present value (NPV)", format!("{:.2}", result.npv)),
        ("Internal rate of return (IRR)", rate_metric(&result.irr)),
        ("Payback period (PP)", period_metric(&result.payback_period)),
        (
            "Discounted payback period (DPP)",
            period_metric(&result.discounted_payback_period),
        ),
    ]
}

pub fn format_metrics(result: &AppraisalResult) -> String {
    render_metrics(result)
        .into_iter()
        .map(|(label, value)| format!("{}: {}", label, value))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_rate_table(table: &RateTable) -> String {
    let mut out = format!("{:<14}{:>12}{:>12}\n", "Bank", "Savings %", "Mortgage %");
    for row in &table.rows {
        out.push_str(&format!(
            "{:<14}{:>12.2}{:>12.2}\n",
            row.bank, row.savings_rate_pct, row.mortgage_rate_pct
        ));
    }
    out
}

/// Prompt asking an LLM to comment on an appraisal.
pub fn commentary_prompt(
    result: &AppraisalResult,
    rate: DiscountRate,
    project_name: Option<&str>,
) -> String {
    let subject = project_name.unwrap_or("the project");
    let verdict_hint = if result.is_viable(rate) {
        "The figures suggest the project clears its cost of capital."
    } else {
        "The figures suggest the project does not clear its cost of capital."
    };

    format!(
        "You are a credit analyst reviewing a loan-funded investment.\n\
         Assess {} using the metrics below, computed at a discount rate (WACC) of {}.\n\n\
         {}\n\n\
         {}\n\
         Metrics shown as N/A or 'never recovers' could not be determined from the cash flows; \
         say so rather than guessing a value.\n\
         Give a short assessment of viability, the main risks, and a lending recommendation.",
        subject,
        rate,
        format_metrics(result),
        verdict_hint
    )
}

/// Prompt asking an LLM to comment on a household's finances.
pub fn household_prompt(assessment: &HouseholdAssessment) -> String {
    format!(
        "You are a family financial adviser.\n\
         Savings rate: {:.2}% of monthly income.\n\
         Debt-to-income ratio: {:.2}%.\n\
         Financial goal: {}.\n\
         Initial advice: {}\n\
         Suggested product: {}\n\
         Give three practical, specific recommendations for this household.",
        assessment.savings_rate,
        assessment.debt_ratio,
        assessment.goal,
        assessment.advice,
        assessment.suggested_product
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::household::{FinancialGoal, HouseholdProfile};

    fn sample_result() -> AppraisalResult {
        AppraisalResult {
            npv: 24.3426,
            irr: Metric::Value(0.2338),
            payback_period: Metric::Value(2.0),
            discounted_payback_period: Metric::NeverRecovers,
        }
    }

    #[test]
    fn test_render_metrics() {
        let rows = render_metrics(&sample_result());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].1, "24.34");
        assert_eq!(rows[1].1, "23.38%");
        assert_eq!(rows[2].1, "2.00 periods");
        assert_eq!(rows[3].1, "never recovers");
    }

    #[test]
    fn test_undefined_irr_rendered_as_na() {
        let result = AppraisalResult {
            irr: Metric::Undefined,
            ..sample_result()
        };
        assert!(format_metrics(&result).contains("Internal rate of return (IRR): N/A"));
    }

    #[test]
    fn test_commentary_prompt() {
        let rate = DiscountRate::new(0.10).unwrap();
        let prompt = commentary_prompt(&sample_result(), rate, Some("Rice mill"));
        assert!(prompt.contains("Rice mill"));
        assert!(prompt.contains("10.00%"));
        assert!(prompt.contains("NPV"));
        assert!(prompt.contains("clears its cost of capital"));
        assert!(!prompt.contains("does not clear"));
    }

    #[test]
    fn test_household_prompt() {
        let assessment = HouseholdProfile::new(
            20_000_000.0,
            15_000_000.0,
            40_000_000.0,
            FinancialGoal::Retirement,
        )
        .unwrap()
        .assess()
        .unwrap();
        let prompt = household_prompt(&assessment);
        assert!(prompt.contains("Savings rate: 25.00%"));
        assert!(prompt.contains("Debt-to-income ratio: 200.00%"));
        assert!(prompt.contains("Retirement"));
    }

    #[test]
    fn test_rate_table_format() {
        let text = format_rate_table(&RateTable::default());
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("Vietcombank"));
        assert!(text.contains("6.50"));
    }
}
