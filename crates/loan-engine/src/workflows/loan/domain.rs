use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::service::LoanServiceError;

/// Identifier wrapper for customers owning loan cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub u64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for persisted loan cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(pub u64);

impl CaseId {
    /// Parse a caller supplied identifier; only positive decimal integers are accepted.
    pub fn parse(raw: &str) -> Result<Self, LoanServiceError> {
        let trimmed = raw.trim();
        let digits_only = !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit());
        match trimmed.parse::<u64>() {
            Ok(value) if digits_only && value > 0 => Ok(Self(value)),
            _ => Err(LoanServiceError::InvalidInput(format!(
                "case id '{trimmed}' is not a positive integer"
            ))),
        }
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of the customer's financial profile, read once per decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: CustomerId,
    pub full_name: String,
    pub credit_score: u16,
    pub monthly_salary: u64,
    pub existing_obligation: u64,
}

/// Requested principal and tenure for a new application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub principal: u64,
    pub duration_months: u32,
}

impl LoanRequest {
    pub fn new(principal: u64, duration_months: u32) -> Result<Self, LoanServiceError> {
        if principal == 0 {
            return Err(LoanServiceError::InvalidInput(
                "loan amount must be a positive integer".to_string(),
            ));
        }
        if duration_months == 0 {
            return Err(LoanServiceError::InvalidInput(
                "duration must be a positive number of months".to_string(),
            ));
        }
        Ok(Self {
            principal,
            duration_months,
        })
    }

    /// Simple installment with no interest component.
    pub fn monthly_installment(&self) -> f64 {
        self.principal as f64 / self.duration_months as f64
    }
}

/// State of a loan case. Cases are written already carrying their first classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Approved,
    SalaryVerification,
    Rejected,
    Unknown,
}

impl LoanStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LoanStatus::Approved => "approved",
            LoanStatus::SalaryVerification => "salary_verification",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Unknown => "unknown",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, LoanStatus::SalaryVerification)
    }

    pub const fn can_transition_to(self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::SalaryVerification, LoanStatus::Approved)
                | (LoanStatus::SalaryVerification, LoanStatus::Rejected)
        )
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Persistent decision record for one application attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanCase {
    pub case_id: CaseId,
    pub customer_id: CustomerId,
    pub principal: u64,
    pub duration_months: u32,
    pub monthly_installment: f64,
    pub limit: f64,
    pub status: LoanStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanCase {
    pub fn view(&self, full_name: &str) -> LoanCaseView {
        LoanCaseView {
            loan_id: self.case_id,
            full_name: full_name.to_string(),
            loan_amount: self.principal,
            duration_months: self.duration_months,
            monthly_emi: round_cents(self.monthly_installment),
            limit_amount: round_cents(self.limit),
            status: self.status.label(),
            message: self.message.clone(),
        }
    }
}

/// Public projection of a case returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanCaseView {
    pub loan_id: CaseId,
    pub full_name: String,
    pub loan_amount: u64,
    pub duration_months: u32,
    pub monthly_emi: f64,
    pub limit_amount: f64,
    pub status: &'static str,
    pub message: String,
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
