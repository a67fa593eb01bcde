//! Bookkeeping side of the balance sheet exchange.
//!
//! Owns the ledger records and answers `BalanceSheetPostDataRequested` with
//! the raw sums for the requested year. The repository is an external
//! collaborator; only its call shape matters here.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::event::request_manager::{RequestManager, RequestResult};
use crate::event_bus::Event;
use crate::event_registry::EventName;

/// Raw ledger sums for one year. Field names match the
/// `BalanceSheetPostDataRetrieved` payload contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub kas: f64,
    pub piutang_usaha: f64,
    pub persediaan: f64,
    pub aktiva_tetap: f64,
    pub hutang_usaha: f64,
    pub modal: f64,
}

/// Query layer over the ledger records. Failures carry the
/// `(code, message)` pair the coordinator's rejection path expects.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn summarize(&self, tahun: i32) -> Result<LedgerSummary, AppError>;
}

/// Wire struct for the incoming request payload.
#[derive(Debug, Deserialize)]
struct PostDataRequest {
    tahun: i32,
}

/// Responder for the balance sheet figures.
pub struct LedgerService {
    repository: Arc<dyn LedgerRepository>,
}

impl LedgerService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self { repository }
    }

    /// Registers this module's handler for `BalanceSheetPostDataRequested`.
    /// Repository failures become error envelopes on the response event.
    pub fn attach(&self, requests: &RequestManager) -> RequestResult<()> {
        let repository = self.repository.clone();
        requests.respond(
            EventName::BalanceSheetPostDataRequested,
            move |event: Event| {
                let repository = repository.clone();
                async move {
                    let query: PostDataRequest = event
                        .payload()
                        .map_err(|e| AppError::bad_request(e.to_string()))?;
                    let summary = repository.summarize(query.tahun).await?;
                    serde_json::to_value(summary).map_err(|e| AppError::internal(e.to_string()))
                }
            },
        )
    }
}
