use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::loan::archive::{ArchiveError, DocumentArchive};
use crate::workflows::loan::domain::{
    CaseId, CustomerId, CustomerProfile, LoanCase, LoanStatus,
};
use crate::workflows::loan::extraction::{
    Extraction, ExtractionError, SalaryDocument, SalaryExtractor,
};
use crate::workflows::loan::letter::PlainTextLetterRenderer;
use crate::workflows::loan::store::{
    InMemoryLoanCaseStore, LoanCaseStore, NewLoanCase, StoreError,
};
use crate::workflows::loan::{CollaboratorTimeouts, EligibilityConfig, LoanDecisionService};

pub(super) const ASHA: CustomerId = CustomerId(12);
pub(super) const RAVI: CustomerId = CustomerId(13);
pub(super) const MEERA: CustomerId = CustomerId(14);

/// Score 750, salary 50,000, obligations 10,000: limit 333,333.33.
pub(super) fn asha() -> CustomerProfile {
    CustomerProfile {
        customer_id: ASHA,
        full_name: "Asha Verma".to_string(),
        credit_score: 750,
        monthly_salary: 50_000,
        existing_obligation: 10_000,
    }
}

/// Below the minimum credit score.
pub(super) fn ravi() -> CustomerProfile {
    CustomerProfile {
        customer_id: RAVI,
        full_name: "Ravi Iyer".to_string(),
        credit_score: 650,
        monthly_salary: 80_000,
        existing_obligation: 0,
    }
}

/// Perfect score and no obligations: limit is exactly 100,000.
pub(super) fn meera() -> CustomerProfile {
    CustomerProfile {
        customer_id: MEERA,
        full_name: "Meera Shah".to_string(),
        credit_score: 900,
        monthly_salary: 10_000,
        existing_obligation: 0,
    }
}

pub(super) fn eligibility_config() -> EligibilityConfig {
    EligibilityConfig::default()
}

pub(super) fn seeded_store() -> Arc<InMemoryLoanCaseStore> {
    Arc::new(InMemoryLoanCaseStore::with_customers([
        asha(),
        ravi(),
        meera(),
    ]))
}

pub(super) fn salary_slip(body: &str) -> SalaryDocument {
    SalaryDocument {
        file_name: "march slip.txt".to_string(),
        content_type: mime::TEXT_PLAIN,
        bytes: body.as_bytes().to_vec(),
    }
}

pub(super) type TestService<X> = LoanDecisionService<InMemoryLoanCaseStore, X>;

pub(super) fn build_service<X>(
    extractor: X,
) -> (TestService<X>, Arc<InMemoryLoanCaseStore>, Arc<MemoryArchive>)
where
    X: SalaryExtractor + 'static,
{
    let store = seeded_store();
    let archive = Arc::new(MemoryArchive::default());
    let service = LoanDecisionService::new(
        store.clone(),
        Arc::new(extractor),
        Arc::new(PlainTextLetterRenderer::new("Team Potato")),
        archive.clone(),
        eligibility_config(),
    )
    .with_timeouts(CollaboratorTimeouts {
        extraction: Duration::from_millis(200),
        store: Duration::from_millis(200),
    });
    (service, store, archive)
}

pub(super) async fn stored_case(store: &InMemoryLoanCaseStore, id: CaseId) -> LoanCase {
    store.case(&id).await.expect("case stored")
}

/// Extractor that always answers with the same extraction.
#[derive(Debug, Clone, Copy)]
pub(super) struct FixedExtractor(pub(super) Extraction);

#[async_trait]
impl SalaryExtractor for FixedExtractor {
    async fn extract(&self, _document: &SalaryDocument) -> Result<Extraction, ExtractionError> {
        Ok(self.0)
    }
}

/// Extractor that answers only after the given delay.
#[derive(Debug, Clone, Copy)]
pub(super) struct SlowExtractor(pub(super) Duration);

#[async_trait]
impl SalaryExtractor for SlowExtractor {
    async fn extract(&self, _document: &SalaryDocument) -> Result<Extraction, ExtractionError> {
        tokio::time::sleep(self.0).await;
        Ok(Extraction::Salary(50_000))
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct OfflineExtractor;

#[async_trait]
impl SalaryExtractor for OfflineExtractor {
    async fn extract(&self, _document: &SalaryDocument) -> Result<Extraction, ExtractionError> {
        Err(ExtractionError::Backend("model quota exhausted".to_string()))
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryArchive {
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl MemoryArchive {
    pub(super) fn uploads(&self) -> Vec<(String, String, Vec<u8>)> {
        self.uploads.lock().expect("archive mutex poisoned").clone()
    }
}

#[async_trait]
impl DocumentArchive for MemoryArchive {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), ArchiveError> {
        self.uploads.lock().expect("archive mutex poisoned").push((
            bucket.to_string(),
            key.to_string(),
            bytes,
        ));
        Ok(())
    }
}

/// Archive that hands control back to the scheduler before storing, letting
/// concurrent verifications interleave between their checks and their writes.
#[derive(Debug, Default)]
pub(super) struct YieldingArchive {
    inner: MemoryArchive,
}

impl YieldingArchive {
    pub(super) fn uploads(&self) -> Vec<(String, String, Vec<u8>)> {
        self.inner.uploads()
    }
}

#[async_trait]
impl DocumentArchive for YieldingArchive {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), ArchiveError> {
        tokio::task::yield_now().await;
        self.inner.upload(bucket, key, bytes).await
    }
}

/// In-memory store counting how many status writes reach it.
pub(super) struct CountingStore {
    pub(super) inner: Arc<InMemoryLoanCaseStore>,
    status_writes: AtomicUsize,
}

impl CountingStore {
    pub(super) fn new(inner: Arc<InMemoryLoanCaseStore>) -> Self {
        Self {
            inner,
            status_writes: AtomicUsize::new(0),
        }
    }

    pub(super) fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoanCaseStore for CountingStore {
    async fn create(&self, case: NewLoanCase) -> Result<LoanCase, StoreError> {
        self.inner.create(case).await
    }

    async fn customer_profile(&self, id: &CustomerId) -> Result<CustomerProfile, StoreError> {
        self.inner.customer_profile(id).await
    }

    async fn case(&self, id: &CaseId) -> Result<LoanCase, StoreError> {
        self.inner.case(id).await
    }

    async fn update_status(
        &self,
        id: &CaseId,
        expected: LoanStatus,
        next: LoanStatus,
        message: String,
    ) -> Result<LoanCase, StoreError> {
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update_status(id, expected, next, message).await
    }
}

#[derive(Debug)]
pub(super) struct ReadOnlyArchive;

#[async_trait]
impl DocumentArchive for ReadOnlyArchive {
    async fn upload(&self, _bucket: &str, key: &str, _bytes: Vec<u8>) -> Result<(), ArchiveError> {
        Err(ArchiveError::Io {
            key: key.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume"),
        })
    }
}

pub(super) struct UnavailableStore;

#[async_trait]
impl LoanCaseStore for UnavailableStore {
    async fn create(&self, _case: NewLoanCase) -> Result<LoanCase, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn customer_profile(&self, _id: &CustomerId) -> Result<CustomerProfile, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn case(&self, _id: &CaseId) -> Result<LoanCase, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn update_status(
        &self,
        _id: &CaseId,
        _expected: LoanStatus,
        _next: LoanStatus,
        _message: String,
    ) -> Result<LoanCase, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
