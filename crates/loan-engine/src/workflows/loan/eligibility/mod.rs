mod classify;
mod config;
mod limit;
mod reverify;

pub use classify::EligibilityBand;
pub use config::EligibilityConfig;
pub use reverify::{ReverificationDecision, ReverificationOutcome};

use super::domain::CustomerProfile;

/// Stateless evaluator applying the configured thresholds to a customer profile.
#[derive(Debug, Clone)]
pub struct EligibilityEngine {
    config: EligibilityConfig,
}

impl EligibilityEngine {
    pub fn new(config: EligibilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    pub fn limit(&self, profile: &CustomerProfile) -> Result<f64, EligibilityError> {
        self.compute_limit(
            profile.credit_score,
            profile.monthly_salary,
            profile.existing_obligation,
        )
    }

    pub fn compute_limit(
        &self,
        credit_score: u16,
        salary: u64,
        existing_obligation: u64,
    ) -> Result<f64, EligibilityError> {
        limit::compute_limit(&self.config, credit_score, salary, existing_obligation)
    }

    pub fn classify(&self, principal: u64, limit: f64) -> EligibilityBand {
        classify::classify(principal, limit)
    }

    pub fn reverify(
        &self,
        stated_salary: u64,
        observed_salary: u64,
        existing_obligation: u64,
        monthly_installment: f64,
    ) -> Result<ReverificationOutcome, EligibilityError> {
        reverify::reverify(
            &self.config,
            stated_salary,
            observed_salary,
            existing_obligation,
            monthly_installment,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityError {
    #[error("credit score {score} is below the minimum of {minimum}")]
    LowCreditScore { score: u16, minimum: u16 },
    #[error("monthly salary must be greater than zero")]
    NonPositiveSalary,
    #[error("salary slip amount {observed} does not match profile salary {stated}")]
    SalaryMismatch { stated: u64, observed: u64 },
}
