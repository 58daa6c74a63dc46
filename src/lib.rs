//! # SmartFin Appraisal
//!
//! A library for appraising loan-funded projects and household finances.
//!
//! ## Core Concepts
//!
//! - **Cash-flow series**: period 0 is the initial outlay, periods 1..N are net flows
//! - **Appraisal**: NPV, IRR, payback period and discounted payback period
//! - **Sentinels**: an IRR that cannot be solved is [`Metric::Undefined`]; a payback
//!   that never happens is [`Metric::NeverRecovers`]. Neither is an error.
//! - **Extraction**: manual entry, labelled text, CSV, or (feature `gemini`) an LLM
//!   all produce the same [`ExtractedFigures`]
//! - **Household ratios**: savings rate, debt-to-income, advice tiers and goal-based products
//!
//! ## Example
//!
//! ```rust
//! use smartfin_appraisal::*;
//!
//! let series = CashFlowSeries::from_investment(100.0, &[50.0, 50.0, 50.0]).unwrap();
//! let rate = DiscountRate::new(0.10).unwrap();
//!
//! let result = appraise(&series, rate).unwrap();
//! assert!((result.npv - 24.34).abs() < 0.01);
//! assert!(result.irr.is_defined());
//! assert_eq!(result.payback_period, Metric::Value(2.0));
//! ```

pub mod appraisal;
pub mod comparison;
pub mod config;
pub mod error;
pub mod household;
pub mod ingestion;
pub mod report;
pub mod schema;
pub mod utils;

#[cfg(feature = "gemini")]
pub mod llm;

pub use appraisal::{
    appraise, discounted_payback_period, irr, npv, payback_period, Appraiser,
};
pub use comparison::{BankRate, ProductUpdate, RateTable};
pub use config::{AppraisalConfig, SolverSettings};
pub use error::{AppraisalError, Result};
pub use household::{FinancialGoal, HouseholdAssessment, HouseholdProfile, SavingsTier};
pub use ingestion::*;
pub use report::{commentary_prompt, format_metrics, household_prompt, render_metrics};
pub use schema::*;

use log::debug;

/// Extracts figures with `extractor` and appraises them in one step.
pub fn appraise_text(
    extractor: &dyn FigureExtractor,
    text: &str,
    config: &AppraisalConfig,
) -> Result<(ExtractedFigures, AppraisalResult)> {
    debug!("Extracting figures with the {} strategy", extractor.name());
    let figures = extractor.extract(text)?;
    let result = Appraiser::new(config.clone()).appraise_figures(&figures)?;
    Ok((figures, result))
}
