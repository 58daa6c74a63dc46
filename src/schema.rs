use crate::error::{AppraisalError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an extracted figure came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct SourceMetadata {
    #[schemars(
        description = "The name of the document or input the figures were read from (e.g., 'loan_application.pdf', 'manual entry')"
    )]
    pub document_name: String,

    #[serde(default)]
    #[schemars(
        description = "The exact text snippet the figure was read from. Only needed when the value was inferred or came from narrative text."
    )]
    pub original_text: Option<String>,
}

/// Net cash flows indexed by period. Period 0 is the initial outlay.
///
/// The index of a flow is its position, so period indices are contiguous
/// from 0 by construction. A series always holds at least two periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct CashFlowSeries {
    flows: Vec<f64>,
}

impl CashFlowSeries {
    pub fn new(flows: Vec<f64>) -> Result<Self> {
        if flows.is_empty() {
            return Err(AppraisalError::InvalidSeries(
                "series is empty".to_string(),
            ));
        }
        if flows.len() < 2 {
            return Err(AppraisalError::InvalidSeries(format!(
                "series needs an initial outlay and at least one period flow, got {} period(s)",
                flows.len()
            )));
        }
        if let Some((period, value)) = flows.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(AppraisalError::InvalidAmount {
                field: format!("cash flow at period {}", period),
                value: *value,
            });
        }

        Ok(Self { flows })
    }

    /// Builds a series from an outlay and the operating flows for periods 1..N.
    /// A positive outlay is taken as a magnitude and negated.
    pub fn from_investment(initial_outlay: f64, flows: &[f64]) -> Result<Self> {
        let mut series = Vec::with_capacity(flows.len() + 1);
        series.push(-initial_outlay.abs());
        series.extend_from_slice(flows);
        Self::new(series)
    }

    /// Builds a series from explicit `(period, amount)` pairs.
    /// Pairs may arrive in any order but must cover 0..N without gaps.
    pub fn from_periods(mut periods: Vec<(u32, f64)>) -> Result<Self> {
        periods.sort_by_key(|(period, _)| *period);

        for (expected, (period, _)) in periods.iter().enumerate() {
            if *period as usize != expected {
                return Err(AppraisalError::InvalidSeries(format!(
                    "period indices must be contiguous from 0: expected period {}, found {}",
                    expected, period
                )));
            }
        }

        Self::new(periods.into_iter().map(|(_, amount)| amount).collect())
    }

    pub fn flows(&self) -> &[f64] {
        &self.flows
    }

    pub fn initial_outlay(&self) -> f64 {
        self.flows[0]
    }

    pub fn operating_flows(&self) -> &[f64] {
        &self.flows[1..]
    }

    /// Number of operating periods (N).
    pub fn periods(&self) -> usize {
        self.flows.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.flows.iter().copied().enumerate()
    }
}

impl TryFrom<Vec<f64>> for CashFlowSeries {
    type Error = AppraisalError;

    fn try_from(flows: Vec<f64>) -> Result<Self> {
        Self::new(flows)
    }
}

impl From<CashFlowSeries> for Vec<f64> {
    fn from(series: CashFlowSeries) -> Self {
        series.flows
    }
}

/// Per-period discount rate as a decimal fraction (0.10 is 10%).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DiscountRate(f64);

impl DiscountRate {
    pub const ZERO: DiscountRate = DiscountRate(0.0);

    pub fn new(rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= -1.0 {
            return Err(AppraisalError::InvalidDiscountRate(rate));
        }
        Ok(Self(rate))
    }

    pub fn from_percent(percent: f64) -> Result<Self> {
        Self::new(percent / 100.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn as_percent(self) -> f64 {
        self.0 * 100.0
    }
}

impl TryFrom<f64> for DiscountRate {
    type Error = AppraisalError;

    fn try_from(rate: f64) -> Result<Self> {
        Self::new(rate)
    }
}

impl From<DiscountRate> for f64 {
    fn from(rate: DiscountRate) -> Self {
        rate.0
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.as_percent())
    }
}

/// A metric that may be numerically inconclusive.
///
/// `Undefined` and `NeverRecovers` are data outcomes, not faults: callers
/// display them (e.g. as "N/A") instead of aborting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Metric {
    Value(f64),
    /// No rate solves the equation, or the solver did not converge.
    Undefined,
    /// The cumulative cash flow never becomes non-negative.
    NeverRecovers,
}

impl Metric {
    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Value(_))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{:.4}", v),
            Metric::Undefined => write!(f, "N/A"),
            Metric::NeverRecovers => write!(f, "never recovers"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppraisalResult {
    pub npv: f64,
    pub irr: Metric,
    pub payback_period: Metric,
    pub discounted_payback_period: Metric,
}

impl AppraisalResult {
    /// True when the project clears its hurdle: positive NPV and, where
    /// defined, an IRR above the discount rate.
    pub fn is_viable(&self, rate: DiscountRate) -> bool {
        let irr_clears = self.irr.value().map_or(true, |irr| irr > rate.value());
        self.npv > 0.0 && irr_clears
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_rejects_short_input() {
        assert!(matches!(
            CashFlowSeries::new(vec![]),
            Err(AppraisalError::InvalidSeries(_))
        ));
        assert!(matches!(
            CashFlowSeries::new(vec![-100.0]),
            Err(AppraisalError::InvalidSeries(_))
        ));
        assert!(CashFlowSeries::new(vec![-100.0, 10.0]).is_ok());
    }

    #[test]
    fn test_series_rejects_non_finite_amounts() {
        let err = CashFlowSeries::new(vec![-100.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, AppraisalError::InvalidAmount { .. }));
    }

    #[test]
    fn test_from_investment_negates_positive_outlay() {
        let series = CashFlowSeries::from_investment(100.0, &[50.0, 60.0]).unwrap();
        assert_eq!(series.flows(), &[-100.0, 50.0, 60.0]);

        let series = CashFlowSeries::from_investment(-100.0, &[50.0]).unwrap();
        assert_eq!(series.initial_outlay(), -100.0);
        assert_eq!(series.periods(), 1);
    }

    #[test]
    fn test_from_periods_requires_contiguous_indices() {
        let series = CashFlowSeries::from_periods(vec![(2, 30.0), (0, -50.0), (1, 20.0)]).unwrap();
        assert_eq!(series.flows(), &[-50.0, 20.0, 30.0]);

        let gap = CashFlowSeries::from_periods(vec![(0, -50.0), (2, 30.0)]);
        assert!(matches!(gap, Err(AppraisalError::InvalidSeries(_))));

        let no_zero = CashFlowSeries::from_periods(vec![(1, 20.0), (2, 30.0)]);
        assert!(no_zero.is_err());
    }

    #[test]
    fn test_discount_rate_domain() {
        assert!(DiscountRate::new(0.1).is_ok());
        assert!(DiscountRate::new(-0.5).is_ok());
        assert!(matches!(
            DiscountRate::new(-1.0),
            Err(AppraisalError::InvalidDiscountRate(_))
        ));
        assert!(DiscountRate::new(-2.0).is_err());
        assert!(DiscountRate::new(f64::INFINITY).is_err());

        let rate = DiscountRate::from_percent(12.5).unwrap();
        assert!((rate.value() - 0.125).abs() < 1e-12);
        assert_eq!(rate.to_string(), "12.50%");
    }

    #[test]
    fn test_metric_display_and_serialization() {
        assert_eq!(Metric::Value(0.25).to_string(), "0.2500");
        assert_eq!(Metric::Undefined.to_string(), "N/A");
        assert_eq!(Metric::NeverRecovers.to_string(), "never recovers");

        let json = serde_json::to_string(&Metric::Value(1.5)).unwrap();
        assert_eq!(json, r#"{"status":"value","value":1.5}"#);
        let json = serde_json::to_string(&Metric::NeverRecovers).unwrap();
        assert_eq!(json, r#"{"status":"never_recovers"}"#);
    }

    #[test]
    fn test_series_deserialization_validates() {
        let series: CashFlowSeries = serde_json::from_str("[-100.0, 60.0, 60.0]").unwrap();
        assert_eq!(series.periods(), 2);

        let bad: std::result::Result<CashFlowSeries, _> = serde_json::from_str("[-100.0]");
        assert!(bad.is_err());

        let rate: std::result::Result<DiscountRate, _> = serde_json::from_str("-1.0");
        assert!(rate.is_err());
    }
}
