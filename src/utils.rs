use crate::error::{AppraisalError, Result};

/// `1 / (1 + rate)^period`
pub fn discount_factor(rate: f64, period: usize) -> f64 {
    1.0 / (1.0 + rate).powi(period as i32)
}

pub fn discounted_flows(flows: &[f64], rate: f64) -> Vec<f64> {
    flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf * discount_factor(rate, t))
        .collect()
}

pub fn cumulative(flows: &[f64]) -> Vec<f64> {
    flows
        .iter()
        .scan(0.0, |acc, cf| {
            *acc += cf;
            Some(*acc)
        })
        .collect()
}

/// Counts sign changes, skipping zero flows.
pub fn sign_changes(flows: &[f64]) -> usize {
    let mut changes = 0;
    let mut last_sign: Option<bool> = None;

    for &cf in flows {
        if cf == 0.0 {
            continue;
        }
        let positive = cf > 0.0;
        if let Some(prev) = last_sign {
            if prev != positive {
                changes += 1;
            }
        }
        last_sign = Some(positive);
    }

    changes
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Parses a figure as typed by people or printed in documents.
///
/// Accepts thousands separators (`1,250,000`), currency markers (`$`, `VND`,
/// `đ`), a trailing `%` (returned as written, not divided), and accounting
/// negatives in parentheses (`(1,000)`).
pub fn parse_amount(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .trim_end_matches('%')
        .replace("VND", "")
        .replace("vnd", "")
        .replace("USD", "")
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '_' | 'đ' | '₫') && !c.is_whitespace())
        .collect();

    let value: f64 = cleaned.parse().map_err(|_| {
        AppraisalError::ExtractionFailed(format!("Could not read '{}' as a number", raw.trim()))
    })?;

    if !value.is_finite() {
        return Err(AppraisalError::ExtractionFailed(format!(
            "Figure '{}' is not a finite number",
            raw.trim()
        )));
    }

    Ok(if negative { -value } else { value })
}
