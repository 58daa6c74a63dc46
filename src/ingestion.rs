//! Figure extraction.
//!
//! Every strategy (manual entry, labelled text, CSV, or an LLM reading a
//! document) produces the same [`ExtractedFigures`], which converts into the
//! calculator's [`CashFlowSeries`] and [`DiscountRate`]. Extraction is best
//! effort; only light coercion is applied on the way in.

use crate::error::{AppraisalError, Result};
use crate::schema::{CashFlowSeries, DiscountRate, SourceMetadata};
use crate::utils::parse_amount;
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Candidate figures for a project appraisal, as read from some input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedFigures {
    #[serde(default)]
    #[schemars(description = "Name of the project or loan purpose, if stated")]
    pub project_name: Option<String>,

    #[serde(default)]
    #[schemars(
        description = "Initial investment (period 0). Either a positive magnitude or a negative outflow; both mean money spent up front."
    )]
    pub initial_investment: Option<f64>,

    #[serde(default)]
    #[schemars(
        description = "Discount rate / WACC as a decimal fraction (0.1 for 10%). Values above 1.0 are read as percentages."
    )]
    pub discount_rate: Option<f64>,

    #[serde(default)]
    #[schemars(
        description = "Net cash flow for each period after the investment, in order: element 0 is period 1, element 1 is period 2, and so on."
    )]
    pub cash_flows: Vec<f64>,

    #[serde(default)]
    #[schemars(description = "Where these figures were read from")]
    pub source: Option<SourceMetadata>,
}

impl ExtractedFigures {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ExtractedFigures)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    /// Converts to calculator inputs.
    ///
    /// A missing rate falls back to `default_rate`. Rates above 1.0 are
    /// treated as percentages.
    pub fn to_inputs(&self, default_rate: Option<f64>) -> Result<(CashFlowSeries, DiscountRate)> {
        let investment = self
            .initial_investment
            .ok_or(AppraisalError::MissingFigure("initial investment"))?;
        if !investment.is_finite() {
            return Err(AppraisalError::InvalidAmount {
                field: "initial investment".to_string(),
                value: investment,
            });
        }

        let series = CashFlowSeries::from_investment(investment, &self.cash_flows)?;

        let raw_rate = self
            .discount_rate
            .or(default_rate)
            .ok_or(AppraisalError::MissingFigure("discount rate"))?;
        let rate = if raw_rate > 1.0 {
            debug!("Reading discount rate {} as a percentage", raw_rate);
            DiscountRate::from_percent(raw_rate)?
        } else {
            DiscountRate::new(raw_rate)?
        };

        Ok((series, rate))
    }
}

/// A way of turning raw input text into candidate figures.
pub trait FigureExtractor {
    fn name(&self) -> &str;

    fn extract(&self, text: &str) -> Result<ExtractedFigures>;
}

/// Numbers typed in by hand: the outlay first, then one flow per period,
/// separated by newlines or semicolons.
#[derive(Debug, Clone, Default)]
pub struct ManualEntryExtractor {
    discount_rate: Option<f64>,
}

impl ManualEntryExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discount_rate(mut self, rate: f64) -> Self {
        self.discount_rate = Some(rate);
        self
    }
}

impl FigureExtractor for ManualEntryExtractor {
    fn name(&self) -> &str {
        "manual entry"
    }

    fn extract(&self, text: &str) -> Result<ExtractedFigures> {
        let values = text
            .split(['\n', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_amount)
            .collect::<Result<Vec<f64>>>()?;

        let (investment, flows) = values.split_first().ok_or_else(|| {
            AppraisalError::ExtractionFailed("No figures were entered".to_string())
        })?;

        Ok(ExtractedFigures {
            project_name: None,
            initial_investment: Some(*investment),
            discount_rate: self.discount_rate,
            cash_flows: flows.to_vec(),
            source: Some(SourceMetadata {
                document_name: self.name().to_string(),
                original_text: None,
            }),
        })
    }
}

/// Reads `label: value` (or `label = value`) lines from free text.
///
/// Recognised labels: investment / outlay / capex, discount rate / WACC,
/// project name, and per-period flows such as `Year 2` or `Period 2`.
/// Vietnamese equivalents (`vốn đầu tư`, `lãi suất chiết khấu`, `năm 2`)
/// are also understood. Unrecognised lines are skipped.
#[derive(Debug, Clone)]
pub struct LabeledTextExtractor {
    document_name: String,
}

impl Default for LabeledTextExtractor {
    fn default() -> Self {
        Self {
            document_name: "free text".to_string(),
        }
    }
}

impl LabeledTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }
}

enum Label {
    Investment,
    Rate,
    Period(u32),
    ProjectName,
}

fn classify_label(label: &str) -> Option<Label> {
    let label = label.trim().to_lowercase();

    const INVESTMENT: [&str; 5] = [
        "investment",
        "outlay",
        "capex",
        "vốn đầu tư",
        "von dau tu",
    ];
    const RATE: [&str; 5] = ["discount", "wacc", "hurdle", "lãi suất", "lai suat"];
    const PERIOD: [&str; 6] = ["year", "period", "month", "cash flow", "năm", "nam "];

    if INVESTMENT.iter().any(|k| label.contains(k)) {
        return Some(Label::Investment);
    }
    if RATE.iter().any(|k| label.contains(k)) {
        return Some(Label::Rate);
    }
    if PERIOD.iter().any(|k| label.contains(k)) {
        if let Some(period) = first_integer(&label) {
            return Some(Label::Period(period));
        }
    }
    if label.contains("project") || label == "name" || label.contains("dự án") {
        return Some(Label::ProjectName);
    }
    None
}

fn first_integer(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// The leading numeric part of a value, dropping trailing words and units.
///
/// Spaces between digit groups (`2 000 000`) and before a trailing `%` are
/// part of the figure.
fn leading_figure(value: &str) -> Option<String> {
    let mut figure = String::new();
    let mut seen_digit = false;
    let mut chars = value.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '0'..='9' => {
                seen_digit = true;
                figure.push(c);
            }
            ',' | '.' | '(' | ')' | '%' => figure.push(c),
            '-' | '$' if !seen_digit => figure.push(c),
            ' ' if !seen_digit => {}
            ' ' => {
                while chars.peek() == Some(&' ') {
                    chars.next();
                }
                match chars.peek() {
                    Some(next) if next.is_ascii_digit() || *next == '%' => {}
                    _ => break,
                }
            }
            _ => break,
        }
    }

    seen_digit.then_some(figure)
}

impl FigureExtractor for LabeledTextExtractor {
    fn name(&self) -> &str {
        "labelled text"
    }

    fn extract(&self, text: &str) -> Result<ExtractedFigures> {
        let mut figures = ExtractedFigures::default();
        let mut flows: BTreeMap<u32, f64> = BTreeMap::new();

        for line in text.lines() {
            let Some((label, value)) = line.split_once([':', '=']) else {
                continue;
            };
            let Some(kind) = classify_label(label) else {
                continue;
            };

            if let Label::ProjectName = kind {
                let name = value.trim();
                if !name.is_empty() {
                    figures.project_name = Some(name.to_string());
                }
                continue;
            }

            let Some(figure) = leading_figure(value) else {
                debug!("No figure found on line '{}'", line.trim());
                continue;
            };
            let amount = parse_amount(&figure)?;

            match kind {
                Label::Investment | Label::Period(0) => figures.initial_investment = Some(amount),
                Label::Rate => {
                    figures.discount_rate = Some(if figure.ends_with('%') {
                        amount / 100.0
                    } else {
                        amount
                    });
                }
                Label::Period(period) => {
                    if flows.insert(period, amount).is_some() {
                        warn!("Period {} appears more than once; keeping the last value", period);
                    }
                }
                Label::ProjectName => {}
            }
        }

        for (expected, period) in (1u32..).zip(flows.keys()) {
            if *period != expected {
                return Err(AppraisalError::ExtractionFailed(format!(
                    "Cash flow for period {} is missing",
                    expected
                )));
            }
        }

        if figures.initial_investment.is_none() && flows.is_empty() {
            return Err(AppraisalError::ExtractionFailed(
                "No recognisable figures in text".to_string(),
            ));
        }

        figures.cash_flows = flows.into_values().collect();
        figures.source = Some(SourceMetadata {
            document_name: self.document_name.clone(),
            original_text: None,
        });

        Ok(figures)
    }
}

/// Reads `period,amount` rows. Period 0 is the outlay.
#[derive(Debug, Clone, Default)]
pub struct CsvExtractor {
    discount_rate: Option<f64>,
}

impl CsvExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discount_rate(mut self, rate: f64) -> Self {
        self.discount_rate = Some(rate);
        self
    }
}

impl FigureExtractor for CsvExtractor {
    fn name(&self) -> &str {
        "csv"
    }

    fn extract(&self, text: &str) -> Result<ExtractedFigures> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &str, fallback: usize| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .unwrap_or(fallback)
        };
        let period_col = column("period", 0);
        let amount_col = column("amount", 1);

        let mut periods = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let period_raw = record.get(period_col).unwrap_or_default();
            let period: u32 = period_raw.parse().map_err(|_| {
                AppraisalError::ExtractionFailed(format!(
                    "Row {}: '{}' is not a period number",
                    row + 1,
                    period_raw
                ))
            })?;
            let amount = parse_amount(record.get(amount_col).unwrap_or_default())?;
            periods.push((period, amount));
        }

        let series = CashFlowSeries::from_periods(periods)?;

        Ok(ExtractedFigures {
            project_name: None,
            initial_investment: Some(series.initial_outlay()),
            discount_rate: self.discount_rate,
            cash_flows: series.operating_flows().to_vec(),
            source: Some(SourceMetadata {
                document_name: self.name().to_string(),
                original_text: None,
            }),
        })
    }
}
