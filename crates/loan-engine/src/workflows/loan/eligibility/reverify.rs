use serde::{Deserialize, Serialize};

use super::config::EligibilityConfig;
use super::EligibilityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverificationDecision {
    Approved,
    Rejected,
}

/// Result of the second decision pass, with the figures it was based on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverificationOutcome {
    pub decision: ReverificationDecision,
    pub available_income: f64,
    pub max_allowed_installment: f64,
}

pub(crate) fn reverify(
    config: &EligibilityConfig,
    stated_salary: u64,
    observed_salary: u64,
    existing_obligation: u64,
    monthly_installment: f64,
) -> Result<ReverificationOutcome, EligibilityError> {
    if observed_salary != stated_salary {
        return Err(EligibilityError::SalaryMismatch {
            stated: stated_salary,
            observed: observed_salary,
        });
    }

    let available_income = stated_salary as f64 - existing_obligation as f64;
    let max_allowed_installment = available_income * config.max_installment_share;
    let decision = if monthly_installment <= max_allowed_installment {
        ReverificationDecision::Approved
    } else {
        ReverificationDecision::Rejected
    };

    Ok(ReverificationOutcome {
        decision,
        available_income,
        max_allowed_installment,
    })
}
