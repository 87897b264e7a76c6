use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{LoanCaseStore, NewLoanCase, StoreEntity, StoreError};
use crate::workflows::loan::domain::{CaseId, CustomerId, CustomerProfile, LoanCase, LoanStatus};

#[derive(Debug, Default)]
struct Tables {
    customers: HashMap<CustomerId, CustomerProfile>,
    cases: HashMap<CaseId, LoanCase>,
    last_case_id: u64,
}

/// Mutex-guarded store mirroring a profile table and a case table.
#[derive(Debug, Default)]
pub struct InMemoryLoanCaseStore {
    tables: Mutex<Tables>,
}

impl InMemoryLoanCaseStore {
    pub fn with_customers<I>(customers: I) -> Self
    where
        I: IntoIterator<Item = CustomerProfile>,
    {
        let customers = customers
            .into_iter()
            .map(|profile| (profile.customer_id, profile))
            .collect();
        Self {
            tables: Mutex::new(Tables {
                customers,
                ..Tables::default()
            }),
        }
    }

    /// Insert or replace a profile, e.g. after a customer corrects their salary.
    pub fn upsert_customer(&self, profile: CustomerProfile) -> Result<(), StoreError> {
        self.lock()?.customers.insert(profile.customer_id, profile);
        Ok(())
    }

    pub fn cases(&self) -> Result<Vec<LoanCase>, StoreError> {
        let tables = self.lock()?;
        let mut cases: Vec<LoanCase> = tables.cases.values().cloned().collect();
        cases.sort_by_key(|case| case.case_id);
        Ok(cases)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl LoanCaseStore for InMemoryLoanCaseStore {
    async fn create(&self, case: NewLoanCase) -> Result<LoanCase, StoreError> {
        let mut tables = self.lock()?;
        if !tables.customers.contains_key(&case.customer_id) {
            return Err(StoreError::NotFound(StoreEntity::Customer));
        }

        tables.last_case_id += 1;
        let now = Utc::now();
        let stored = LoanCase {
            case_id: CaseId(tables.last_case_id),
            customer_id: case.customer_id,
            principal: case.principal,
            duration_months: case.duration_months,
            monthly_installment: case.monthly_installment,
            limit: case.limit,
            status: case.status,
            message: case.message,
            created_at: now,
            updated_at: now,
        };
        tables.cases.insert(stored.case_id, stored.clone());
        Ok(stored)
    }

    async fn customer_profile(&self, id: &CustomerId) -> Result<CustomerProfile, StoreError> {
        self.lock()?
            .customers
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(StoreEntity::Customer))
    }

    async fn case(&self, id: &CaseId) -> Result<LoanCase, StoreError> {
        self.lock()?
            .cases
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(StoreEntity::Case))
    }

    async fn update_status(
        &self,
        id: &CaseId,
        expected: LoanStatus,
        next: LoanStatus,
        message: String,
    ) -> Result<LoanCase, StoreError> {
        if !expected.can_transition_to(next) {
            return Err(StoreError::IllegalTransition {
                from: expected,
                to: next,
            });
        }

        let mut tables = self.lock()?;
        let case = tables
            .cases
            .get_mut(id)
            .ok_or(StoreError::NotFound(StoreEntity::Case))?;

        if case.status != expected {
            return Err(StoreError::StatusConflict {
                expected,
                actual: case.status,
            });
        }

        case.status = next;
        case.message = message;
        case.updated_at = Utc::now();
        Ok(case.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poisoned_store() -> InMemoryLoanCaseStore {
        let store = InMemoryLoanCaseStore::default();
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = store.tables.lock();
                    panic!("writer crashed while holding the tables");
                })
                .join();
        });
        store
    }

    fn profile() -> CustomerProfile {
        CustomerProfile {
            customer_id: CustomerId(12),
            full_name: "Asha Verma".to_string(),
            credit_score: 750,
            monthly_salary: 50_000,
            existing_obligation: 10_000,
        }
    }

    #[test]
    fn poisoned_tables_surface_as_unavailable() {
        let store = poisoned_store();

        assert!(matches!(
            store.upsert_customer(profile()),
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(store.cases(), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn seeding_indexes_customers_by_id() {
        let store = InMemoryLoanCaseStore::with_customers([profile()]);
        let tables = store.lock().expect("fresh store");
        assert_eq!(tables.customers.get(&CustomerId(12)), Some(&profile()));
        assert_eq!(tables.last_case_id, 0);
    }
}
