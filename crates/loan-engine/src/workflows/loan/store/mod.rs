mod memory;

pub use memory::InMemoryLoanCaseStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{CaseId, CustomerId, CustomerProfile, LoanCase, LoanStatus};

/// Fields the orchestrator supplies when recording a freshly classified application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLoanCase {
    pub customer_id: CustomerId,
    pub principal: u64,
    pub duration_months: u32,
    pub monthly_installment: f64,
    pub limit: f64,
    pub status: LoanStatus,
    pub message: String,
}

/// Persistence boundary for profiles and loan cases.
///
/// Every operation is atomic on its own. `update_status` is a compare-and-swap: the
/// write only happens while the stored status still equals `expected`, so two racing
/// re-verifications of the same case produce at most one transition. Transitions the
/// status machine forbids fail with `IllegalTransition` without touching the case.
#[async_trait]
pub trait LoanCaseStore: Send + Sync {
    async fn create(&self, case: NewLoanCase) -> Result<LoanCase, StoreError>;
    async fn customer_profile(&self, id: &CustomerId) -> Result<CustomerProfile, StoreError>;
    async fn case(&self, id: &CaseId) -> Result<LoanCase, StoreError>;
    async fn update_status(
        &self,
        id: &CaseId,
        expected: LoanStatus,
        next: LoanStatus,
        message: String,
    ) -> Result<LoanCase, StoreError>;
}

/// Which table a lookup missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEntity {
    Customer,
    Case,
}

impl std::fmt::Display for StoreEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreEntity::Customer => f.write_str("customer"),
            StoreEntity::Case => f.write_str("loan case"),
        }
    }
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(StoreEntity),
    #[error("case status is {actual}, expected {expected}")]
    StatusConflict {
        expected: LoanStatus,
        actual: LoanStatus,
    },
    #[error("case cannot move from {from} to {to}")]
    IllegalTransition { from: LoanStatus, to: LoanStatus },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
