//! Composition root: owns the event bus and request manager and wires the
//! module services onto them. Nothing here is process-global; tests and the
//! HTTP layer construct their own `System` and inject it.

use std::sync::Arc;

use tracing::warn;

use crate::balance_sheet::BalanceSheetService;
use crate::config::SystemConfig;
use crate::event::request_manager::{RequestManager, RequestResult};
use crate::event_bus::EventBus;
use crate::fund_usage::{FundUsageRepository, FundUsageService};
use crate::ledger::{LedgerRepository, LedgerService};
use crate::salary::{SalaryRepository, SalaryService};

pub struct System {
    config: SystemConfig,
    event_bus: Arc<EventBus>,
    request_manager: Arc<RequestManager>,
}

impl System {
    pub fn new(config: SystemConfig) -> Self {
        let event_bus = Arc::new(EventBus::new());
        let request_manager = Arc::new(RequestManager::new(
            event_bus.clone(),
            config.request_timeout,
        ));
        Self {
            config,
            event_bus,
            request_manager,
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    pub fn request_manager(&self) -> Arc<RequestManager> {
        self.request_manager.clone()
    }

    /// Responders must be attached before any coordinator publishes their
    /// request event; attach everything at start-up.
    pub fn attach_ledger(&self, repository: Arc<dyn LedgerRepository>) -> RequestResult<()> {
        LedgerService::new(repository).attach(&self.request_manager)
    }

    pub fn attach_salary(&self, repository: Arc<dyn SalaryRepository>) -> RequestResult<()> {
        SalaryService::new(repository).attach(&self.request_manager)
    }

    pub fn balance_sheet_service(&self) -> BalanceSheetService {
        BalanceSheetService::new(self.request_manager.clone())
    }

    pub fn fund_usage_service(
        &self,
        repository: Arc<dyn FundUsageRepository>,
    ) -> FundUsageService {
        FundUsageService::new(repository, self.request_manager.clone())
    }

    /// Fails every in-flight request so no caller hangs past shutdown.
    pub async fn shutdown(&self) {
        let cancelled = self
            .request_manager
            .cancel_pending(&self.config.shutdown_reason)
            .await;
        if cancelled > 0 {
            warn!(cancelled, "cancelled pending requests at shutdown");
        }
    }
}
