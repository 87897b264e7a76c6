//! Two-stage loan eligibility workflow.
//!
//! An application is classified against a pre-approved limit and recorded as a case.
//! Cases landing in the salary verification band are resolved later, once a salary
//! figure has been extracted from an uploaded salary slip and matched against the
//! customer's profile.

pub mod archive;
pub mod domain;
pub mod eligibility;
pub mod extraction;
pub mod letter;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use archive::{ArchiveError, DocumentArchive, FilesystemArchive};
pub use domain::{
    CaseId, CustomerId, CustomerProfile, LoanCase, LoanCaseView, LoanRequest, LoanStatus,
};
pub use eligibility::{
    EligibilityBand, EligibilityConfig, EligibilityEngine, EligibilityError,
    ReverificationDecision, ReverificationOutcome,
};
pub use extraction::{
    parse_extraction_reply, Extraction, ExtractionError, PlainTextSalaryExtractor,
    SalaryDocument, SalaryExtractor, NOT_SALARY_DOCUMENT,
};
pub use letter::{
    LetterRenderer, PlainTextLetterRenderer, RenderError, SanctionLetter, SanctionTerms,
};
pub use router::loan_router;
pub use service::{CollaboratorTimeouts, LoanDecision, LoanDecisionService, LoanServiceError};
pub use store::{InMemoryLoanCaseStore, LoanCaseStore, NewLoanCase, StoreEntity, StoreError};
