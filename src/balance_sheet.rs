//! Balance sheet aggregate and its query-style coordinator.
//!
//! The balance sheet itself stores nothing: its figures are raw ledger sums
//! computed by the module that owns the bookkeeping records. The service here
//! requests those figures over the event bus and applies them to the
//! read-only aggregate; it never touches the other module's repository.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::event::request_manager::{RequestError, RequestManager};
use crate::event_bus::{Event, EventError};
use crate::event_registry::{EventName, RequestId};

/// Externally computed balance sheet figures. The serde field names are the
/// cross-module payload contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    pub kas: f64,
    pub piutang_usaha: f64,
    pub persediaan: f64,
    pub aktiva_tetap: f64,
    pub hutang_usaha: f64,
    pub modal: f64,
}

/// Request payload: which year's figures to compute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostDataQuery {
    pub tahun: i32,
}

/// Read-only aggregate over one year's figures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceSheet {
    tahun: i32,
    post: PostData,
}

impl BalanceSheet {
    pub fn new(tahun: i32) -> Self {
        Self {
            tahun,
            post: PostData::default(),
        }
    }

    pub fn tahun(&self) -> i32 {
        self.tahun
    }

    pub fn post_data(&self) -> &PostData {
        &self.post
    }

    pub fn apply_post_data(&mut self, post: PostData) {
        self.post = post;
    }

    /// Total assets: the sum of the asset-side figures.
    pub fn total_aktiva(&self) -> f64 {
        self.post.kas + self.post.piutang_usaha + self.post.persediaan + self.post.aktiva_tetap
    }

    /// Total liabilities and equity.
    pub fn total_pasiva(&self) -> f64 {
        self.post.hutang_usaha + self.post.modal
    }
}

/// Builds balance sheets by asking the bookkeeping module for the year's
/// figures over the event bus.
pub struct BalanceSheetService {
    requests: Arc<RequestManager>,
}

impl BalanceSheetService {
    pub fn new(requests: Arc<RequestManager>) -> Self {
        Self { requests }
    }

    /// Assembles the balance sheet for `tahun`.
    ///
    /// Publishes `BalanceSheetPostDataRequested` and awaits the retrieved
    /// figures. An error envelope from the responder surfaces as
    /// [`RequestError::Rejected`] with the responder's code and message
    /// intact.
    #[instrument(skip(self))]
    pub async fn balance_sheet(&self, tahun: i32) -> Result<BalanceSheet, BalanceSheetError> {
        let request = Event::request_builder()
            .event_name(EventName::BalanceSheetPostDataRequested)
            .request_id(RequestId::new())
            .payload(&PostDataQuery { tahun })
            .build()?;

        let value = self.requests.request_payload(request).await?;
        let post: PostData = serde_json::from_value(value)
            .map_err(|e| BalanceSheetError::MalformedPostData(e.to_string()))?;

        let mut sheet = BalanceSheet::new(tahun);
        sheet.apply_post_data(post);
        Ok(sheet)
    }
}

#[derive(Debug, Error)]
pub enum BalanceSheetError {
    #[error("Event error: {0}")]
    Event(#[from] EventError),
    #[error("Request error: {0}")]
    Request(#[from] RequestError),
    #[error("Malformed post data payload: {0}")]
    MalformedPostData(String),
}
