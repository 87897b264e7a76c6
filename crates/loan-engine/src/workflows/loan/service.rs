use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use super::archive::{ArchiveError, DocumentArchive};
use super::domain::{
    CaseId, CustomerId, CustomerProfile, LoanCase, LoanCaseView, LoanRequest, LoanStatus,
};
use super::eligibility::{
    EligibilityBand, EligibilityConfig, EligibilityEngine, EligibilityError,
    ReverificationDecision,
};
use super::extraction::{Extraction, SalaryDocument, SalaryExtractor};
use super::letter::{LetterRenderer, RenderError, SanctionLetter, SanctionTerms};
use super::store::{LoanCaseStore, NewLoanCase, StoreEntity, StoreError};

/// Upper bounds on how long the orchestrator waits for its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollaboratorTimeouts {
    pub extraction: Duration,
    pub store: Duration,
}

impl Default for CollaboratorTimeouts {
    fn default() -> Self {
        Self {
            extraction: Duration::from_secs(30),
            store: Duration::from_secs(3),
        }
    }
}

/// Result of either flow: the case as persisted, plus the letter when approved.
#[derive(Debug, Clone)]
pub struct LoanDecision {
    pub case: LoanCase,
    pub customer_name: String,
    pub letter: Option<SanctionLetter>,
}

impl LoanDecision {
    pub fn view(&self) -> LoanCaseView {
        self.case.view(&self.customer_name)
    }
}

/// Orchestrates the initial application and the salary-slip re-verification.
///
/// The service is the only writer of loan cases. Every store call is bounded by
/// the store timeout and every extraction call by the extraction timeout; neither
/// flow issues a write until all checks preceding it have passed.
pub struct LoanDecisionService<S, X> {
    store: Arc<S>,
    extractor: Arc<X>,
    letters: Arc<dyn LetterRenderer>,
    archive: Arc<dyn DocumentArchive>,
    engine: Arc<EligibilityEngine>,
    timeouts: CollaboratorTimeouts,
    bucket: String,
    archive_attempts: AtomicU64,
}

impl<S, X> LoanDecisionService<S, X>
where
    S: LoanCaseStore + 'static,
    X: SalaryExtractor + 'static,
{
    pub fn new(
        store: Arc<S>,
        extractor: Arc<X>,
        letters: Arc<dyn LetterRenderer>,
        archive: Arc<dyn DocumentArchive>,
        config: EligibilityConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            letters,
            archive,
            engine: Arc::new(EligibilityEngine::new(config)),
            timeouts: CollaboratorTimeouts::default(),
            bucket: "salary-slips".to_string(),
            archive_attempts: AtomicU64::new(0),
        }
    }

    pub fn with_timeouts(mut self, timeouts: CollaboratorTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn engine(&self) -> &EligibilityEngine {
        &self.engine
    }

    /// Classify a new application and record it as a case.
    pub async fn apply(
        &self,
        customer_id: &CustomerId,
        request: LoanRequest,
    ) -> Result<LoanDecision, LoanServiceError> {
        let request = LoanRequest::new(request.principal, request.duration_months)?;
        let profile = self
            .within_store_timeout(self.store.customer_profile(customer_id))
            .await?;
        let monthly_installment = request.monthly_installment();

        let (limit, status, message) = match self.engine.limit(&profile) {
            Ok(limit) => {
                let band = self.engine.classify(request.principal, limit);
                if band == EligibilityBand::Unknown {
                    warn!(
                        customer_id = %customer_id,
                        principal = request.principal,
                        limit,
                        "requested principal sits on an eligibility band boundary"
                    );
                }
                (limit, band.status(), band.message().to_string())
            }
            Err(err @ EligibilityError::LowCreditScore { .. }) => {
                warn!(customer_id = %customer_id, %err, "application rejected on credit score");
                (0.0, LoanStatus::Rejected, err.to_string())
            }
            Err(err) => return Err(LoanServiceError::InvalidInput(err.to_string())),
        };

        let case = self
            .within_store_timeout(self.store.create(NewLoanCase {
                customer_id: *customer_id,
                principal: request.principal,
                duration_months: request.duration_months,
                monthly_installment,
                limit,
                status,
                message,
            }))
            .await?;

        info!(
            case_id = %case.case_id,
            customer_id = %customer_id,
            status = %case.status,
            limit = case.limit,
            "loan application classified"
        );

        self.decision(profile, case)
    }

    /// Re-evaluate a case awaiting salary verification against an uploaded salary slip.
    pub async fn verify_salary(
        &self,
        customer_id: &CustomerId,
        raw_case_id: &str,
        document: SalaryDocument,
    ) -> Result<LoanDecision, LoanServiceError> {
        let case_id = CaseId::parse(raw_case_id)?;

        let observed_salary = match self.extract(&document).await? {
            Extraction::Salary(amount) => amount,
            Extraction::NotSalaryDocument => {
                warn!(case_id = %case_id, file = %document.file_name, "not a salary document");
                return Err(LoanServiceError::DocumentInvalid);
            }
        };

        let case = self.owned_case(customer_id, case_id).await?;
        let profile = self
            .within_store_timeout(self.store.customer_profile(customer_id))
            .await?;

        if case.status.is_terminal() {
            return Err(LoanServiceError::InvalidCaseStatus {
                status: case.status,
            });
        }

        let outcome = self
            .engine
            .reverify(
                profile.monthly_salary,
                observed_salary,
                profile.existing_obligation,
                case.monthly_installment,
            )
            .map_err(|err| match err {
                EligibilityError::SalaryMismatch { stated, observed } => {
                    warn!(case_id = %case_id, stated, observed, "salary slip mismatch");
                    LoanServiceError::SalaryMismatch { stated, observed }
                }
                other => LoanServiceError::InvalidInput(other.to_string()),
            })?;

        let (next, message) = match outcome.decision {
            ReverificationDecision::Approved => (
                LoanStatus::Approved,
                "approval granted after salary verification".to_string(),
            ),
            ReverificationDecision::Rejected => (
                LoanStatus::Rejected,
                format!(
                    "monthly installment {:.2} exceeds the allowed {:.2}",
                    case.monthly_installment, outcome.max_allowed_installment
                ),
            ),
        };

        let key = self.archive_key(case_id, &document.file_name);
        self.archive.upload(&self.bucket, &key, document.bytes).await?;

        let updated = self
            .within_store_timeout(self.store.update_status(
                &case_id,
                LoanStatus::SalaryVerification,
                next,
                message,
            ))
            .await
            .inspect_err(|err| {
                if let LoanServiceError::InvalidCaseStatus { status } = err {
                    warn!(case_id = %case_id, %status, "case changed during re-verification");
                }
            })?;

        info!(
            case_id = %case_id,
            status = %updated.status,
            max_allowed_installment = outcome.max_allowed_installment,
            "salary re-verification resolved"
        );

        self.decision(profile, updated)
    }

    /// Current state of one of the caller's cases.
    pub async fn case_view(
        &self,
        customer_id: &CustomerId,
        raw_case_id: &str,
    ) -> Result<LoanCaseView, LoanServiceError> {
        let case_id = CaseId::parse(raw_case_id)?;
        let case = self.owned_case(customer_id, case_id).await?;
        let profile = self
            .within_store_timeout(self.store.customer_profile(customer_id))
            .await?;
        Ok(case.view(&profile.full_name))
    }

    /// Every attempt gets its own object, so a call losing the status race cannot
    /// overwrite the document archived by the winner.
    fn archive_key(&self, case_id: CaseId, file_name: &str) -> String {
        let attempt = self.archive_attempts.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}/{}-{}-{}",
            case_id,
            Utc::now().timestamp_micros(),
            attempt,
            object_file_name(file_name)
        )
    }

    async fn owned_case(
        &self,
        customer_id: &CustomerId,
        case_id: CaseId,
    ) -> Result<LoanCase, LoanServiceError> {
        let case = self.within_store_timeout(self.store.case(&case_id)).await?;
        if case.customer_id != *customer_id {
            return Err(LoanServiceError::NotFound(StoreEntity::Case));
        }
        Ok(case)
    }

    async fn extract(&self, document: &SalaryDocument) -> Result<Extraction, LoanServiceError> {
        match tokio::time::timeout(self.timeouts.extraction, self.extractor.extract(document))
            .await
        {
            Ok(Ok(extraction)) => Ok(extraction),
            Ok(Err(err)) => Err(LoanServiceError::ExtractionUnavailable(err.to_string())),
            Err(_) => Err(LoanServiceError::ExtractionUnavailable(format!(
                "no reply within {:?}",
                self.timeouts.extraction
            ))),
        }
    }

    async fn within_store_timeout<T, F>(&self, operation: F) -> Result<T, LoanServiceError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeouts.store, operation).await {
            Ok(result) => result.map_err(LoanServiceError::from),
            Err(_) => Err(LoanServiceError::StoreUnavailable(format!(
                "no reply within {:?}",
                self.timeouts.store
            ))),
        }
    }

    fn decision(
        &self,
        profile: CustomerProfile,
        case: LoanCase,
    ) -> Result<LoanDecision, LoanServiceError> {
        let letter = if case.status == LoanStatus::Approved {
            Some(self.letters.render(&SanctionTerms {
                customer_name: profile.full_name.clone(),
                principal: case.principal,
                duration_months: case.duration_months,
                monthly_installment: case.monthly_installment,
            })?)
        } else {
            None
        };

        Ok(LoanDecision {
            case,
            customer_name: profile.full_name,
            letter,
        })
    }
}

/// Uploaded file names become a single object key segment without whitespace.
fn object_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "salary-slip".to_string(),
        _ => cleaned,
    }
}

/// Error raised by the loan decision service.
#[derive(Debug, thiserror::Error)]
pub enum LoanServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} not found")]
    NotFound(StoreEntity),
    #[error("loan case is {status}; only cases awaiting salary verification can be re-verified")]
    InvalidCaseStatus { status: LoanStatus },
    #[error(
        "salary slip amount {observed} doesn't match your profile salary {stated}; \
         update the profile salary and retry"
    )]
    SalaryMismatch { stated: u64, observed: u64 },
    #[error("uploaded document is not a valid salary slip")]
    DocumentInvalid,
    #[error("document extraction unavailable: {0}")]
    ExtractionUnavailable(String),
    #[error("loan store unavailable: {0}")]
    StoreUnavailable(String),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl LoanServiceError {
    pub const fn kind(&self) -> &'static str {
        match self {
            LoanServiceError::InvalidInput(_) => "invalid_input",
            LoanServiceError::NotFound(_) => "not_found",
            LoanServiceError::InvalidCaseStatus { .. } => "invalid_case_status",
            LoanServiceError::SalaryMismatch { .. } => "salary_mismatch",
            LoanServiceError::DocumentInvalid => "document_invalid",
            LoanServiceError::ExtractionUnavailable(_) => "extraction_unavailable",
            LoanServiceError::StoreUnavailable(_) => "store_unavailable",
            LoanServiceError::Archive(_) => "archive_unavailable",
            LoanServiceError::Render(_) => "render_failed",
        }
    }

    /// Whether resubmitting the same request may succeed; no partial writes happen on these.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoanServiceError::ExtractionUnavailable(_)
                | LoanServiceError::StoreUnavailable(_)
                | LoanServiceError::Archive(_)
        )
    }
}

impl From<StoreError> for LoanServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(entity) => Self::NotFound(entity),
            StoreError::StatusConflict { actual, .. } => {
                Self::InvalidCaseStatus { status: actual }
            }
            StoreError::IllegalTransition { from, .. } => {
                Self::InvalidCaseStatus { status: from }
            }
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
        }
    }
}
