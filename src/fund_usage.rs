//! Fund usage module: command-style coordinator with a conditional cascade.
//!
//! Deleting a fund usage row is a local mutation, but rows recorded under an
//! HR/honorarium sub-category are backed by an employee salary record owned
//! by the salary module. For those rows the delete additionally publishes
//! `CancelEmployeeSalary` and waits for the confirmation before the
//! operation as a whole completes. A failed cascade fails the delete call;
//! the already-executed local delete is not rolled back here — compensation
//! is the salary module's concern.

use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::event::request_manager::{RequestError, RequestManager};
use crate::event_bus::{Event, EventError};
use crate::event_registry::{EventName, RequestId};

lazy_static! {
    /// Sub-categories whose rows are backed by a salary record.
    static ref SALARY_SUB_CATEGORY: Regex = Regex::new(r"HR|Honorarium").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundUsage {
    pub id: String,
    pub tahun: i32,
    pub kategori: String,
    pub sub_kategori: String,
    pub jumlah: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundUsageRepository: Send + Sync {
    /// Deletes the row and returns it, or a `(code, message)`-shaped error.
    async fn delete(&self, id: &str) -> Result<FundUsage, AppError>;
}

/// Payload published with `CancelEmployeeSalary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelSalaryCommand {
    pub fund_usage_id: String,
}

pub struct FundUsageService {
    repository: Arc<dyn FundUsageRepository>,
    requests: Arc<RequestManager>,
}

impl FundUsageService {
    pub fn new(repository: Arc<dyn FundUsageRepository>, requests: Arc<RequestManager>) -> Self {
        Self {
            repository,
            requests,
        }
    }

    /// Deletes a fund usage row, cascading to the linked salary record when
    /// the sub-category says there is one.
    ///
    /// The cascade failure path rethrows the responder's code and message;
    /// callers see the delete fail even though the row itself is already
    /// gone.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<FundUsage, FundUsageError> {
        let deleted = self.repository.delete(id).await?;

        if SALARY_SUB_CATEGORY.is_match(&deleted.sub_kategori) {
            debug!(
                id,
                sub_kategori = %deleted.sub_kategori,
                "deleted row is salary-backed, cancelling linked salary record"
            );
            let request = Event::request_builder()
                .event_name(EventName::CancelEmployeeSalary)
                .request_id(RequestId::new())
                .payload(&CancelSalaryCommand {
                    fund_usage_id: deleted.id.clone(),
                })
                .build()?;
            self.requests.request_payload(request).await?;
        }

        Ok(deleted)
    }
}

#[derive(Debug, Error)]
pub enum FundUsageError {
    #[error("Repository error: {0}")]
    Repository(#[from] AppError),
    #[error("Event error: {0}")]
    Event(#[from] EventError),
    #[error("Request error: {0}")]
    Request(#[from] RequestError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn honorarium_row(id: &str) -> FundUsage {
        FundUsage {
            id: id.to_string(),
            tahun: 2023,
            kategori: "Belanja Pegawai".to_string(),
            sub_kategori: "Honorarium Guru".to_string(),
            jumlah: 1_500_000,
        }
    }

    fn operational_row(id: &str) -> FundUsage {
        FundUsage {
            id: id.to_string(),
            tahun: 2023,
            kategori: "Belanja Barang".to_string(),
            sub_kategori: "Operasional".to_string(),
            jumlah: 250_000,
        }
    }

    fn service_with(repository: MockFundUsageRepository) -> (Arc<RequestManager>, FundUsageService) {
        let bus = Arc::new(EventBus::new());
        let requests = Arc::new(RequestManager::new(bus, Duration::from_millis(200)));
        let service = FundUsageService::new(Arc::new(repository), requests.clone());
        (requests, service)
    }

    #[test]
    fn test_salary_sub_category_pattern() {
        assert!(SALARY_SUB_CATEGORY.is_match("Honorarium Guru"));
        assert!(SALARY_SUB_CATEGORY.is_match("HR"));
        assert!(!SALARY_SUB_CATEGORY.is_match("Operasional"));
    }

    #[tokio::test]
    async fn test_delete_without_cascade() {
        let mut repository = MockFundUsageRepository::new();
        repository
            .expect_delete()
            .withf(|id| id == "fu-2")
            .returning(|id| Ok(operational_row(id)));

        // No salary responder attached: a cascade would time out, so success
        // proves no cascade was published.
        let (_, service) = service_with(repository);
        let deleted = service.delete("fu-2").await.unwrap();
        assert_eq!(deleted.sub_kategori, "Operasional");
    }

    #[tokio::test]
    async fn test_delete_cascades_for_honorarium_rows() {
        let mut repository = MockFundUsageRepository::new();
        repository
            .expect_delete()
            .returning(|id| Ok(honorarium_row(id)));

        let (requests, service) = service_with(repository);
        requests
            .respond(EventName::CancelEmployeeSalary, |event: Event| async move {
                let command: CancelSalaryCommand =
                    event.payload().map_err(|e| AppError::bad_request(e.to_string()))?;
                assert_eq!(command.fund_usage_id, "fu-1");
                Ok(json!({ "deleted": true }))
            })
            .unwrap();

        let deleted = service.delete("fu-1").await.unwrap();
        assert_eq!(deleted.id, "fu-1");
    }

    #[tokio::test]
    async fn test_cascade_failure_fails_the_delete() {
        let mut repository = MockFundUsageRepository::new();
        repository
            .expect_delete()
            .returning(|id| Ok(honorarium_row(id)));

        let (requests, service) = service_with(repository);
        requests
            .respond(EventName::CancelEmployeeSalary, |_| async move {
                Err(AppError::not_found("salary record not found"))
            })
            .unwrap();

        let err = service.delete("fu-1").await.unwrap_err();
        match err {
            FundUsageError::Request(RequestError::Rejected(app)) => {
                assert_eq!(app.code, 404);
                assert_eq!(app.message, "salary record not found");
            }
            other => panic!("expected rejected cascade, got {other:?}"),
        }
    }
}
