use serde::{Deserialize, Serialize};

/// Thresholds and multipliers applied by the eligibility rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityConfig {
    pub minimum_credit_score: u16,
    pub maximum_credit_score: u16,
    /// Cap scores at `maximum_credit_score` before computing the score fraction.
    pub clamp_credit_score: bool,
    pub salary_multiplier: f64,
    /// Share of the uncommitted salary a new installment may consume.
    pub max_installment_share: f64,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            minimum_credit_score: 700,
            maximum_credit_score: 900,
            clamp_credit_score: false,
            salary_multiplier: 10.0,
            max_installment_share: 0.5,
        }
    }
}
