//! # simkeu-core: School Finance Module Coordination
//!
//! Coordination core of the simkeu school financial backend. The surrounding
//! application is CRUD services behind an HTTP API; this crate provides the
//! piece with actual design content: the in-process event bus and the
//! synchronous-request-over-asynchronous-event bridge the modules use to ask
//! each other for data or side effects without static coupling.
//!
//! ## Components
//!
//! - Event routing and listener lifecycle ([`event_registry`], [`event_bus`])
//! - Request/response coordination with correlation ids and bounded waits
//!   ([`event::request_manager`])
//! - The two exchange shapes the application uses: the balance sheet pulling
//!   externally computed figures ([`balance_sheet`], [`ledger`]) and the fund
//!   usage delete cascading into a salary cancellation ([`fund_usage`],
//!   [`salary`])
//! - Composition root owning the injected bus ([`system`])
//!
//! ## Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use simkeu_core::{config::SystemConfig, system::System};
//! # use simkeu_core::ledger::{LedgerRepository, LedgerSummary};
//! # use simkeu_core::error::AppError;
//! # struct SqlLedger;
//! # #[async_trait::async_trait]
//! # impl LedgerRepository for SqlLedger {
//! #     async fn summarize(&self, _tahun: i32) -> Result<LedgerSummary, AppError> {
//! #         Ok(LedgerSummary::default())
//! #     }
//! # }
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let system = System::new(SystemConfig::default());
//! system.attach_ledger(Arc::new(SqlLedger))?;
//!
//! let sheet = system.balance_sheet_service().balance_sheet(2023).await?;
//! println!("total aktiva: {}", sheet.total_aktiva());
//! # Ok(())
//! # }
//! ```

pub mod balance_sheet;
pub mod config;
pub mod error;
pub mod event;
pub mod event_registry;
pub mod fund_usage;
pub mod ledger;
pub mod salary;
pub mod system;

// Re-exports
pub use error::{AppError, Error, InternalResult};
pub use event::event_bus;
pub use event::request_manager;
