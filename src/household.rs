use crate::error::{AppraisalError, Result};
use crate::utils::round_to;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialGoal {
    Accumulation,
    Investment,
    HomePurchase,
    DebtRepayment,
    Education,
    Retirement,
}

impl FinancialGoal {
    pub const ALL: [FinancialGoal; 6] = [
        FinancialGoal::Accumulation,
        FinancialGoal::Investment,
        FinancialGoal::HomePurchase,
        FinancialGoal::DebtRepayment,
        FinancialGoal::Education,
        FinancialGoal::Retirement,
    ];

    pub fn suggested_product(&self) -> &'static str {
        match self {
            FinancialGoal::Accumulation => {
                "Flexible savings package, around 5.5% per year."
            }
            FinancialGoal::Investment => {
                "Investment package: bank shares and reputable corporate bonds."
            }
            FinancialGoal::HomePurchase => "Home loan with preferential rates from 6.5% per year.",
            FinancialGoal::DebtRepayment => {
                "Debt restructuring package: 6 to 12 month extension with a rate up to 1.2% lower."
            }
            // Education has no dedicated product and shares the long-horizon plan.
            FinancialGoal::Education | FinancialGoal::Retirement => {
                "Smart retirement savings plan: safe accumulation at an attractive rate."
            }
        }
    }
}

impl fmt::Display for FinancialGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FinancialGoal::Accumulation => "Accumulation",
            FinancialGoal::Investment => "Investment",
            FinancialGoal::HomePurchase => "Home purchase",
            FinancialGoal::DebtRepayment => "Debt repayment",
            FinancialGoal::Education => "Education",
            FinancialGoal::Retirement => "Retirement",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsTier {
    /// Below 10% of income.
    Low,
    /// 10% up to 25%.
    Moderate,
    /// 25% and above.
    Strong,
}

impl SavingsTier {
    pub fn from_rate(savings_rate_pct: f64) -> Self {
        if savings_rate_pct < 10.0 {
            SavingsTier::Low
        } else if savings_rate_pct < 25.0 {
            SavingsTier::Moderate
        } else {
            SavingsTier::Strong
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            SavingsTier::Low => {
                "Savings are low. Consider cutting spending or adding a side income."
            }
            SavingsTier::Moderate => {
                "Savings are healthy. Start a term deposit or a low-risk investment."
            }
            SavingsTier::Strong => {
                "Excellent. Long-term investment packages or bank bonds are worth considering."
            }
        }
    }
}

/// Monthly household figures as entered on the intake form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdProfile {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub total_debt: f64,
    pub goal: FinancialGoal,
}

impl HouseholdProfile {
    pub fn new(
        monthly_income: f64,
        monthly_expenses: f64,
        total_debt: f64,
        goal: FinancialGoal,
    ) -> Result<Self> {
        let profile = Self {
            monthly_income,
            monthly_expenses,
            total_debt,
            goal,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("monthly income", self.monthly_income),
            ("monthly expenses", self.monthly_expenses),
            ("total debt", self.total_debt),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppraisalError::InvalidAmount {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// `(income - expenses) / income` as a percentage, rounded to 2 decimals.
    /// Zero when there is no income.
    pub fn savings_rate(&self) -> f64 {
        if self.monthly_income > 0.0 {
            round_to(
                (self.monthly_income - self.monthly_expenses) / self.monthly_income * 100.0,
                2,
            )
        } else {
            0.0
        }
    }

    /// `debt / income` as a percentage, rounded to 2 decimals.
    /// Zero when there is no income.
    pub fn debt_ratio(&self) -> f64 {
        if self.monthly_income > 0.0 {
            round_to(self.total_debt / self.monthly_income * 100.0, 2)
        } else {
            0.0
        }
    }

    pub fn assess(&self) -> Result<HouseholdAssessment> {
        self.validate()?;

        let savings_rate = self.savings_rate();
        let debt_ratio = self.debt_ratio();
        let tier = SavingsTier::from_rate(savings_rate);

        debug!(
            "Household assessment: savings {}%, debt {}%, tier {:?}",
            savings_rate, debt_ratio, tier
        );

        Ok(HouseholdAssessment {
            savings_rate,
            debt_ratio,
            tier,
            advice: tier.advice().to_string(),
            goal: self.goal,
            suggested_product: self.goal.suggested_product().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdAssessment {
    pub savings_rate: f64,
    pub debt_ratio: f64,
    pub tier: SavingsTier,
    pub advice: String,
    pub goal: FinancialGoal,
    pub suggested_product: String,
}
