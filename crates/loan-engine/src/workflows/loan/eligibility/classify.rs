use serde::{Deserialize, Serialize};

use super::super::domain::LoanStatus;

/// Outcome of comparing the requested principal against the pre-approved limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityBand {
    Approved,
    NeedsVerification,
    Rejected,
    /// The principal sits exactly on `limit` or `2 * limit`, which no band covers.
    Unknown,
}

impl EligibilityBand {
    pub const fn status(self) -> LoanStatus {
        match self {
            EligibilityBand::Approved => LoanStatus::Approved,
            EligibilityBand::NeedsVerification => LoanStatus::SalaryVerification,
            EligibilityBand::Rejected => LoanStatus::Rejected,
            EligibilityBand::Unknown => LoanStatus::Unknown,
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            EligibilityBand::Approved => "instant approval granted",
            EligibilityBand::NeedsVerification => {
                "please upload salary slip for further verification"
            }
            EligibilityBand::Rejected => "requested loan exceeds maximum eligibility",
            EligibilityBand::Unknown => "unable to determine eligibility",
        }
    }
}

pub(crate) fn classify(principal: u64, limit: f64) -> EligibilityBand {
    let principal = principal as f64;
    let ceiling = 2.0 * limit;

    if principal < limit {
        EligibilityBand::Approved
    } else if limit < principal && principal < ceiling {
        EligibilityBand::NeedsVerification
    } else if principal > ceiling {
        EligibilityBand::Rejected
    } else {
        EligibilityBand::Unknown
    }
}
