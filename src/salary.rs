//! Employee salary module: responder side of the cancellation cascade.
//!
//! When the fund usage module deletes an honorarium-backed row it publishes
//! `CancelEmployeeSalary`; the handler here cancels the linked salary record
//! and answers with `EmployeeSalaryDeleted`. A repository failure is reported
//! as an error envelope, never left to hang the requester.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::event::request_manager::{RequestManager, RequestResult};
use crate::event_bus::Event;
use crate::event_registry::EventName;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SalaryRepository: Send + Sync {
    /// Cancels the salary record linked to a deleted fund usage row.
    async fn cancel_for_fund_usage(&self, fund_usage_id: &str) -> Result<(), AppError>;
}

/// Wire struct for the incoming cancellation command.
#[derive(Debug, Deserialize)]
struct CancelSalaryCommand {
    fund_usage_id: String,
}

pub struct SalaryService {
    repository: Arc<dyn SalaryRepository>,
}

impl SalaryService {
    pub fn new(repository: Arc<dyn SalaryRepository>) -> Self {
        Self { repository }
    }

    /// Registers this module's handler for `CancelEmployeeSalary`.
    pub fn attach(&self, requests: &RequestManager) -> RequestResult<()> {
        let repository = self.repository.clone();
        requests.respond(EventName::CancelEmployeeSalary, move |event: Event| {
            let repository = repository.clone();
            async move {
                let command: CancelSalaryCommand = event
                    .payload()
                    .map_err(|e| AppError::bad_request(e.to_string()))?;
                repository
                    .cancel_for_fund_usage(&command.fund_usage_id)
                    .await?;
                Ok(json!({ "deleted": true }))
            }
        })
    }
}
