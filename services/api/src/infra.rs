use loan_engine::config::AppConfig;
use loan_engine::workflows::loan::{
    CustomerId, CustomerProfile, DocumentArchive, InMemoryLoanCaseStore, LoanDecisionService,
    PlainTextLetterRenderer, PlainTextSalaryExtractor,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type DecisionService =
    LoanDecisionService<InMemoryLoanCaseStore, PlainTextSalaryExtractor>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Profiles loaded into the in-memory store until a real profile source is wired in.
pub(crate) fn seed_customers() -> Vec<CustomerProfile> {
    vec![
        CustomerProfile {
            customer_id: CustomerId(12),
            full_name: "Asha Verma".to_string(),
            credit_score: 750,
            monthly_salary: 50_000,
            existing_obligation: 10_000,
        },
        CustomerProfile {
            customer_id: CustomerId(13),
            full_name: "Ravi Iyer".to_string(),
            credit_score: 650,
            monthly_salary: 80_000,
            existing_obligation: 0,
        },
        CustomerProfile {
            customer_id: CustomerId(14),
            full_name: "Meera Shah".to_string(),
            credit_score: 900,
            monthly_salary: 10_000,
            existing_obligation: 0,
        },
    ]
}

/// Wire the decision service from configuration with the in-process collaborators.
pub(crate) fn build_decision_service(
    config: &AppConfig,
    archive: Arc<dyn DocumentArchive>,
) -> DecisionService {
    let store = InMemoryLoanCaseStore::with_customers(seed_customers());
    LoanDecisionService::new(
        Arc::new(store),
        Arc::new(PlainTextSalaryExtractor),
        Arc::new(PlainTextLetterRenderer::new(
            config.documents.lender_name.clone(),
        )),
        archive,
        config.eligibility.clone(),
    )
    .with_timeouts(config.timeouts)
    .with_bucket(config.documents.bucket.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_customers_have_unique_ids_and_positive_salaries() {
        let customers = seed_customers();
        let mut ids: Vec<_> = customers.iter().map(|c| c.customer_id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), customers.len());
        assert!(customers.iter().all(|c| c.monthly_salary > 0));
    }
}
