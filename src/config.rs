use crate::error::{AppraisalError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_TOLERANCE: f64 = 1e-7;
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Root-finder limits for the IRR solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Iteration budget, applied separately to the Newton and bisection phases.
    pub max_iterations: usize,
    /// Relative residual tolerance on NPV, scaled by the series' gross magnitude.
    /// The absolute residual is capped at 1e-6 unless float precision forbids it.
    pub tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppraisalConfig {
    pub solver: SolverSettings,

    /// Rate used when extracted figures carry none (decimal fraction).
    pub default_discount_rate: Option<f64>,

    /// Model name for the optional LLM layer.
    pub model: String,
}

impl Default for AppraisalConfig {
    fn default() -> Self {
        Self {
            solver: SolverSettings::default(),
            default_discount_rate: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl AppraisalConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AppraisalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.solver.max_iterations == 0 {
            return Err(AppraisalError::ConfigError(
                "solver.max_iterations must be at least 1".to_string(),
            ));
        }
        if !self.solver.tolerance.is_finite() || self.solver.tolerance <= 0.0 {
            return Err(AppraisalError::ConfigError(format!(
                "solver.tolerance must be a positive number, got {}",
                self.solver.tolerance
            )));
        }
        if let Some(rate) = self.default_discount_rate {
            if !rate.is_finite() || rate <= -1.0 {
                return Err(AppraisalError::InvalidDiscountRate(rate));
            }
        }
        if self.model.trim().is_empty() {
            return Err(AppraisalError::ConfigError(
                "model name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config =
            AppraisalConfig::from_json_str(r#"{ "default_discount_rate": 0.08 }"#).unwrap();
        assert_eq!(config.solver, SolverSettings::default());
        assert_eq!(config.default_discount_rate, Some(0.08));
        assert_eq!(config.model, DEFAULT_MODEL);

        let config =
            AppraisalConfig::from_json_str(r#"{ "solver": { "max_iterations": 50 } }"#).unwrap();
        assert_eq!(config.solver.max_iterations, 50);
        assert_eq!(config.solver.tolerance, DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_iterations =
            AppraisalConfig::from_json_str(r#"{ "solver": { "max_iterations": 0 } }"#);
        assert!(matches!(zero_iterations, Err(AppraisalError::ConfigError(_))));

        let bad_rate = AppraisalConfig::from_json_str(r#"{ "default_discount_rate": -1.5 }"#);
        assert!(matches!(bad_rate, Err(AppraisalError::InvalidDiscountRate(_))));

        let not_json = AppraisalConfig::from_json_str("solver = 3");
        assert!(matches!(not_json, Err(AppraisalError::SerializationError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = AppraisalConfig::from_path("/definitely/not/here/appraisal.json");
        assert!(matches!(result, Err(AppraisalError::IoError(_))));
    }
}
