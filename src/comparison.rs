use crate::error::{AppraisalError, Result};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRate {
    pub bank: String,
    pub savings_rate_pct: f64,
    pub mortgage_rate_pct: f64,
}

impl BankRate {
    pub fn new(bank: impl Into<String>, savings_rate_pct: f64, mortgage_rate_pct: f64) -> Self {
        Self {
            bank: bank.into(),
            savings_rate_pct,
            mortgage_rate_pct,
        }
    }
}

/// Static side-by-side comparison of savings and home-loan rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub rows: Vec<BankRate>,
}

impl Default for RateTable {
    /// Indicative figures for the four large state-owned banks.
    fn default() -> Self {
        Self {
            rows: vec![
                BankRate::new("Agribank", 5.5, 6.5),
                BankRate::new("Vietcombank", 5.3, 6.8),
                BankRate::new("BIDV", 5.2, 6.9),
                BankRate::new("Vietinbank", 5.4, 6.7),
            ],
        }
    }
}

impl RateTable {
    pub fn new(rows: Vec<BankRate>) -> Self {
        Self { rows }
    }

    pub fn get(&self, bank: &str) -> Option<&BankRate> {
        self.rows.iter().find(|r| r.bank.eq_ignore_ascii_case(bank))
    }

    pub fn best_savings(&self) -> Option<&BankRate> {
        self.rows
            .iter()
            .max_by(|a, b| a.savings_rate_pct.total_cmp(&b.savings_rate_pct))
    }

    pub fn cheapest_mortgage(&self) -> Option<&BankRate> {
        self.rows
            .iter()
            .min_by(|a, b| a.mortgage_rate_pct.total_cmp(&b.mortgage_rate_pct))
    }
}

/// A staff-entered change to a loan or savings product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub product_name: String,
    pub rate_pct: f64,
    #[serde(default)]
    pub note: Option<String>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.product_name.trim().is_empty() {
            return Err(AppraisalError::ValidationError {
                field: "product_name".to_string(),
                details: "must not be empty".to_string(),
            });
        }
        if !self.rate_pct.is_finite() || self.rate_pct < 0.0 {
            return Err(AppraisalError::InvalidAmount {
                field: format!("rate for '{}'", self.product_name.trim()),
                value: self.rate_pct,
            });
        }
        Ok(())
    }

    /// Validates the update and returns the confirmation shown to staff.
    /// Nothing is stored.
    pub fn confirm(&self) -> Result<String> {
        self.validate()?;
        let name = self.product_name.trim();
        info!("Product update accepted: {} at {}%", name, self.rate_pct);
        Ok(format!(
            "Product '{}' has been updated with a rate of {}%.",
            name, self.rate_pct
        ))
    }
}
