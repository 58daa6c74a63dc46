use crate::config::{AppraisalConfig, SolverSettings};
use crate::error::Result;
use crate::ingestion::ExtractedFigures;
use crate::schema::{AppraisalResult, CashFlowSeries, DiscountRate, Metric};
use crate::utils::{discount_factor, discounted_flows, sign_changes};
use log::{debug, info, warn};

// Bracket used when Newton-Raphson gives up.
const BISECTION_LOW: f64 = -0.99;
const BISECTION_HIGH: f64 = 10.0;
const MIN_SLOPE: f64 = 1e-20;
const MIN_BRACKET_WIDTH: f64 = 1e-12;
// Largest NPV residual accepted as a root, whatever the relative tolerance.
const MAX_RESIDUAL: f64 = 1e-6;
// Below this multiple of the gross magnitude, rounding noise dominates the residual.
const PRECISION_FLOOR: f64 = 64.0 * f64::EPSILON;
// Cumulative shortfall still counted as recovered, relative to the gross magnitude.
const RECOVERY_SLACK: f64 = 1e-9;

/// Net present value: `Σ CF_t / (1 + r)^t`, with period 0 undiscounted.
pub fn npv(series: &CashFlowSeries, rate: DiscountRate) -> f64 {
    npv_at(series.flows(), rate.value())
}

fn npv_at(flows: &[f64], rate: f64) -> f64 {
    flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf * discount_factor(rate, t))
        .sum()
}

/// NPV and its derivative with respect to the rate.
fn npv_and_derivative(flows: &[f64], rate: f64) -> (f64, f64) {
    let mut value = 0.0;
    let mut slope = 0.0;

    for (t, &cf) in flows.iter().enumerate() {
        value += cf / (1.0 + rate).powi(t as i32);
        if t > 0 {
            slope -= (t as f64) * cf / (1.0 + rate).powi(t as i32 + 1);
        }
    }

    (value, slope)
}

/// Internal rate of return, seeded at `seed`.
///
/// Runs damped Newton-Raphson first and falls back to bisection over
/// `[-0.99, 10.0]`. Returns [`Metric::Undefined`] when the flows never
/// change sign or neither phase converges within the iteration budget.
pub fn irr(series: &CashFlowSeries, seed: DiscountRate, settings: &SolverSettings) -> Metric {
    let flows = series.flows();

    let changes = sign_changes(flows);
    if changes == 0 {
        debug!("IRR undefined: cash flows never change sign");
        return Metric::Undefined;
    }
    if changes > 1 {
        debug!("Cash flows change sign more than once; IRR may not be unique");
    }

    let tolerance = residual_tolerance(flows, settings);

    let mut rate = seed.value().clamp(BISECTION_LOW, BISECTION_HIGH);

    for iteration in 0..settings.max_iterations {
        let (value, slope) = npv_and_derivative(flows, rate);

        if value.abs() <= tolerance {
            debug!("IRR converged by Newton-Raphson after {} iterations", iteration);
            return Metric::Value(rate);
        }

        if !slope.is_finite() || slope.abs() < MIN_SLOPE {
            debug!("Newton-Raphson derivative vanished at rate {}", rate);
            break;
        }

        let next = rate - value / slope;
        if !next.is_finite() {
            break;
        }

        // Halve the distance to -1 rather than leave the domain.
        rate = if next <= -1.0 { (rate - 1.0) / 2.0 } else { next };
    }

    bisection(flows, tolerance, settings.max_iterations)
}

/// Relative tolerance scaled by the gross magnitude, capped at
/// [`MAX_RESIDUAL`] but never tighter than float precision allows.
fn residual_tolerance(flows: &[f64], settings: &SolverSettings) -> f64 {
    let scale = gross_magnitude(flows);
    (settings.tolerance * scale)
        .min(MAX_RESIDUAL)
        .max(scale * PRECISION_FLOOR)
}

fn gross_magnitude(flows: &[f64]) -> f64 {
    flows.iter().map(|cf| cf.abs()).sum::<f64>().max(1.0)
}

fn bisection(flows: &[f64], tolerance: f64, max_iterations: usize) -> Metric {
    let mut low = BISECTION_LOW;
    let mut high = BISECTION_HIGH;
    let mut value_low = npv_at(flows, low);
    let value_high = npv_at(flows, high);

    if value_low.is_nan() || value_high.is_nan() || value_low.signum() == value_high.signum() {
        debug!("IRR undefined: no root bracketed in [{}, {}]", low, high);
        return Metric::Undefined;
    }

    for _ in 0..max_iterations {
        let mid = (low + high) / 2.0;
        let value_mid = npv_at(flows, mid);

        if value_mid.abs() <= tolerance || (high - low) / 2.0 < MIN_BRACKET_WIDTH {
            return Metric::Value(mid);
        }

        if value_mid.signum() == value_low.signum() {
            low = mid;
            value_low = value_mid;
        } else {
            high = mid;
        }
    }

    warn!(
        "IRR solver did not converge within {} iterations",
        max_iterations
    );
    Metric::Undefined
}

/// Simple payback period on undiscounted flows.
pub fn payback_period(series: &CashFlowSeries) -> Metric {
    payback_from(series.flows())
}

/// Payback period on flows discounted at `rate`.
pub fn discounted_payback_period(series: &CashFlowSeries, rate: DiscountRate) -> Metric {
    payback_from(&discounted_flows(series.flows(), rate.value()))
}

/// Finds the first period `k` whose cumulative flow is non-negative and
/// interpolates within it by the flow realised in period `k`.
///
/// A shortfall within rounding noise of zero counts as recovered at `k`.
fn payback_from(flows: &[f64]) -> Metric {
    let slack = RECOVERY_SLACK * gross_magnitude(flows);
    let mut cumulative = 0.0;

    for (k, &cf) in flows.iter().enumerate() {
        let previous = cumulative;
        cumulative += cf;

        if cumulative >= -slack {
            if k == 0 {
                return Metric::Value(0.0);
            }
            if cumulative.abs() <= slack || cf <= 0.0 {
                return Metric::Value(k as f64);
            }
            let fraction = (previous.abs() / cf).clamp(0.0, 1.0);
            return Metric::Value((k - 1) as f64 + fraction);
        }
    }

    Metric::NeverRecovers
}

/// Runs the full appraisal with a fixed solver configuration.
#[derive(Debug, Clone, Default)]
pub struct Appraiser {
    config: AppraisalConfig,
}

impl Appraiser {
    pub fn new(config: AppraisalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppraisalConfig {
        &self.config
    }

    pub fn appraise(&self, series: &CashFlowSeries, rate: DiscountRate) -> Result<AppraisalResult> {
        self.config.validate()?;

        debug!(
            "Appraising {} operating periods at {} (outlay {})",
            series.periods(),
            rate,
            series.initial_outlay()
        );

        let result = AppraisalResult {
            npv: npv(series, rate),
            irr: irr(series, rate, &self.config.solver),
            payback_period: payback_period(series),
            discounted_payback_period: discounted_payback_period(series, rate),
        };

        info!(
            "Appraisal complete: NPV {:.2}, IRR {}, PP {}, DPP {}",
            result.npv, result.irr, result.payback_period, result.discounted_payback_period
        );

        Ok(result)
    }

    /// Validates raw inputs at the boundary, then appraises.
    pub fn appraise_values(&self, flows: &[f64], rate: f64) -> Result<AppraisalResult> {
        let rate = DiscountRate::new(rate)?;
        let series = CashFlowSeries::new(flows.to_vec())?;
        self.appraise(&series, rate)
    }

    /// Converts extracted figures, falling back to the configured default rate.
    pub fn appraise_figures(&self, figures: &ExtractedFigures) -> Result<AppraisalResult> {
        let (series, rate) = figures.to_inputs(self.config.default_discount_rate)?;
        self.appraise(&series, rate)
    }
}

pub fn appraise(series: &CashFlowSeries, rate: DiscountRate) -> Result<AppraisalResult> {
    Appraiser::default().appraise(series, rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppraisalError;

    fn series(flows: &[f64]) -> CashFlowSeries {
        CashFlowSeries::new(flows.to_vec()).unwrap()
    }

    fn rate(r: f64) -> DiscountRate {
        DiscountRate::new(r).unwrap()
    }

    #[test]
    fn test_single_period_project() {
        let s = series(&[-100.0, 110.0]);
        let result = appraise(&s, DiscountRate::ZERO).unwrap();

        assert!((result.npv - 10.0).abs() < 1e-9);
        let irr = result.irr.value().unwrap();
        assert!((irr - 0.10).abs() < 1e-6, "Expected 10% IRR, got {}", irr);

        let pp = result.payback_period.value().unwrap();
        let dpp = result.discounted_payback_period.value().unwrap();
        assert!((pp - 100.0 / 110.0).abs() < 1e-9);
        assert!((dpp - pp).abs() < 1e-12);
    }

    #[test]
    fn test_three_period_annuity() {
        let s = series(&[-100.0, 50.0, 50.0, 50.0]);
        let result = appraise(&s, rate(0.10)).unwrap();

        let expected_npv = 50.0 / 1.1 + 50.0 / 1.21 + 50.0 / 1.331 - 100.0;
        assert!((result.npv - expected_npv).abs() < 1e-9);
        assert!((result.npv - 24.34).abs() < 0.01);

        let irr = result.irr.value().unwrap();
        assert!((irr - 0.2337).abs() < 1e-3, "Expected ~23.4% IRR, got {}", irr);
        assert!(npv_at(s.flows(), irr).abs() < 1e-3);
        assert!(result.is_viable(rate(0.10)));

        assert_eq!(result.payback_period, Metric::Value(2.0));
        let dpp = result.discounted_payback_period.value().unwrap();
        assert!(dpp > 2.0 && dpp < 3.0);
    }

    #[test]
    fn test_all_negative_flows() {
        let s = series(&[-100.0, -10.0, -10.0]);
        let result = appraise(&s, rate(0.05)).unwrap();

        assert_eq!(result.irr, Metric::Undefined);
        assert_eq!(result.payback_period, Metric::NeverRecovers);
        assert_eq!(result.discounted_payback_period, Metric::NeverRecovers);
        assert!(result.npv < -100.0);
        assert!(!result.is_viable(rate(0.05)));
    }

    #[test]
    fn test_degenerate_rate_rejected() {
        let appraiser = Appraiser::default();
        let result = appraiser.appraise_values(&[-100.0, 110.0], -1.0);
        assert!(matches!(result, Err(AppraisalError::InvalidDiscountRate(_))));

        let result = appraiser.appraise_values(&[-100.0], 0.1);
        assert!(matches!(result, Err(AppraisalError::InvalidSeries(_))));
    }

    #[test]
    fn test_payback_edge_cases() {
        // Non-negative at period 0.
        assert_eq!(payback_period(&series(&[0.0, 10.0])), Metric::Value(0.0));
        assert_eq!(payback_period(&series(&[5.0, -1.0])), Metric::Value(0.0));

        // Exact recovery at a period boundary.
        assert_eq!(
            payback_period(&series(&[-100.0, 40.0, 60.0, 10.0])),
            Metric::Value(2.0)
        );

        // A zero flow period never crosses; recovery comes later.
        let pp = payback_period(&series(&[-100.0, 50.0, 0.0, 100.0]))
            .value()
            .unwrap();
        assert!((pp - 2.5).abs() < 1e-12);

        assert_eq!(
            payback_period(&series(&[-100.0, 30.0, 30.0])),
            Metric::NeverRecovers
        );
    }

    #[test]
    fn test_payback_exact_recovery_despite_rounding() {
        // 0.1 + 0.3 sums a few ULPs short of 0.4.
        assert_eq!(
            payback_period(&series(&[-0.4, 0.1, 0.3])),
            Metric::Value(2.0)
        );
        assert_eq!(
            payback_period(&series(&[-1.2, 1.1, 0.1])),
            Metric::Value(2.0)
        );
        assert_eq!(
            discounted_payback_period(&series(&[-100.0, 108.0]), rate(0.08)),
            Metric::Value(1.0)
        );

        // A genuine shortfall is still reported.
        assert_eq!(
            payback_period(&series(&[-0.4, 0.1, 0.29])),
            Metric::NeverRecovers
        );
    }

    #[test]
    fn test_payback_fraction_stays_within_crossing_period() {
        let pp = payback_period(&series(&[-1000.0, 300.0, 400.0, 500.0]))
            .value()
            .unwrap();
        assert!(pp > 2.0 && pp <= 3.0);
        assert!((pp - 2.6).abs() < 1e-12);
    }

    #[test]
    fn test_irr_residual_capped_for_small_series() {
        let s = series(&[-100.0, 50.0, 50.0, 50.0]);
        let settings = SolverSettings::default();
        assert!(residual_tolerance(s.flows(), &settings) <= 1e-6);

        let irr = irr(&s, rate(0.10), &settings).value().unwrap();
        assert!(npv_at(s.flows(), irr).abs() < 1.01e-6);
    }

    #[test]
    fn test_irr_residual_respects_float_precision_for_large_series() {
        let large = [-1.5e12, 4.0e11, 4.5e11, 5.0e11, 5.0e11];
        let tolerance = residual_tolerance(&large, &SolverSettings::default());
        assert!(tolerance > 1e-6);
        assert!(tolerance < 1.0);
    }

    #[test]
    fn test_discounted_payback_uses_crossing_period_flow() {
        let s = series(&[-100.0, 60.0, 60.0]);
        let r = rate(0.10);
        let d1 = 60.0 / 1.1;
        let d2 = 60.0 / 1.21;
        let expected = 1.0 + (100.0 - d1) / d2;

        let dpp = discounted_payback_period(&s, r).value().unwrap();
        assert!((dpp - expected).abs() < 1e-12);
        assert!(dpp >= payback_period(&s).value().unwrap());
    }

    #[test]
    fn test_discounting_can_prevent_recovery() {
        let s = series(&[-100.0, 50.0, 50.0]);
        assert_eq!(payback_period(&s), Metric::Value(2.0));
        assert_eq!(
            discounted_payback_period(&s, rate(0.10)),
            Metric::NeverRecovers
        );
    }

    #[test]
    fn test_irr_seed_far_from_root() {
        let s = series(&[-1000.0, 300.0, 400.0, 500.0, 200.0]);
        let irr = irr(&s, rate(5.0), &SolverSettings::default())
            .value()
            .unwrap();
        assert!(npv_at(s.flows(), irr).abs() < 1e-3);
    }

    #[test]
    fn test_irr_negative_rate() {
        // Returns less than invested: IRR is below zero.
        let s = series(&[-100.0, 40.0, 40.0]);
        let irr = irr(&s, rate(0.10), &SolverSettings::default())
            .value()
            .unwrap();
        assert!(irr < 0.0);
        assert!(npv_at(s.flows(), irr).abs() < 1e-4);
    }

    #[test]
    fn test_irr_tight_budget_reports_undefined() {
        let s = series(&[-1000.0, 300.0, 400.0, 500.0, 200.0]);
        let settings = SolverSettings {
            max_iterations: 1,
            tolerance: 1e-12,
        };
        assert_eq!(irr(&s, rate(3.0), &settings), Metric::Undefined);
    }

    #[test]
    fn test_npv_and_derivative_agree_with_finite_difference() {
        let flows = [-100.0, 30.0, 40.0, 50.0];
        let (value, slope) = npv_and_derivative(&flows, 0.08);
        assert!((value - npv_at(&flows, 0.08)).abs() < 1e-12);

        let h = 1e-6;
        let numeric = (npv_at(&flows, 0.08 + h) - npv_at(&flows, 0.08 - h)) / (2.0 * h);
        assert!((slope - numeric).abs() < 1e-4);
    }
}
