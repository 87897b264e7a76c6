use super::config::EligibilityConfig;
use super::EligibilityError;

/// Pre-approved limit scaled by the credit score fraction and the share of salary
/// not already committed to obligations. Never negative.
pub(crate) fn compute_limit(
    config: &EligibilityConfig,
    credit_score: u16,
    salary: u64,
    existing_obligation: u64,
) -> Result<f64, EligibilityError> {
    if credit_score < config.minimum_credit_score {
        return Err(EligibilityError::LowCreditScore {
            score: credit_score,
            minimum: config.minimum_credit_score,
        });
    }
    if salary == 0 {
        return Err(EligibilityError::NonPositiveSalary);
    }

    let score = if config.clamp_credit_score {
        credit_score.min(config.maximum_credit_score)
    } else {
        credit_score
    };
    let score_fraction = f64::from(score) / f64::from(config.maximum_credit_score);

    let salary = salary as f64;
    let uncommitted_ratio = (salary - existing_obligation as f64) / salary;

    let limit = salary * config.salary_multiplier * score_fraction * uncommitted_ratio;
    Ok(limit.max(0.0))
}
