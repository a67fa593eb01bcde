//! Full-system round trips: both cross-module exchanges wired through the
//! composition root, success and failure paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use simkeu_core::config::SystemConfig;
use simkeu_core::error::AppError;
use simkeu_core::event::request_manager::RequestError;
use simkeu_core::fund_usage::{FundUsage, FundUsageError, FundUsageRepository};
use simkeu_core::ledger::{LedgerRepository, LedgerSummary};
use simkeu_core::salary::SalaryRepository;
use simkeu_core::system::System;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

struct FakeLedger;

#[async_trait]
impl LedgerRepository for FakeLedger {
    async fn summarize(&self, tahun: i32) -> Result<LedgerSummary, AppError> {
        if tahun != 2023 {
            return Err(AppError::not_found(format!("no ledger entries for {tahun}")));
        }
        Ok(LedgerSummary {
            kas: 100.0,
            piutang_usaha: 50.0,
            persediaan: 25.0,
            aktiva_tetap: 325.0,
            hutang_usaha: 200.0,
            modal: 300.0,
        })
    }
}

struct FakeFundUsages {
    deletes: AtomicUsize,
    sub_kategori: &'static str,
}

impl FakeFundUsages {
    fn new(sub_kategori: &'static str) -> Self {
        Self {
            deletes: AtomicUsize::new(0),
            sub_kategori,
        }
    }
}

#[async_trait]
impl FundUsageRepository for FakeFundUsages {
    async fn delete(&self, id: &str) -> Result<FundUsage, AppError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(FundUsage {
            id: id.to_string(),
            tahun: 2023,
            kategori: "Belanja Pegawai".to_string(),
            sub_kategori: self.sub_kategori.to_string(),
            jumlah: 1_500_000,
        })
    }
}

struct FakeSalaries {
    cancellations: AtomicUsize,
    fail_with: Option<AppError>,
}

impl FakeSalaries {
    fn new() -> Self {
        Self {
            cancellations: AtomicUsize::new(0),
            fail_with: None,
        }
    }

    fn failing(err: AppError) -> Self {
        Self {
            cancellations: AtomicUsize::new(0),
            fail_with: Some(err),
        }
    }
}

#[async_trait]
impl SalaryRepository for FakeSalaries {
    async fn cancel_for_fund_usage(&self, _fund_usage_id: &str) -> Result<(), AppError> {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[tokio::test]
async fn test_balance_sheet_round_trip() {
    init_tracing();
    let system = System::new(SystemConfig::default());
    system.attach_ledger(Arc::new(FakeLedger)).unwrap();

    let sheet = system
        .balance_sheet_service()
        .balance_sheet(2023)
        .await
        .unwrap();

    assert_eq!(sheet.tahun(), 2023);
    assert_eq!(sheet.total_aktiva(), 100.0 + 50.0 + 25.0 + 325.0);
    assert_eq!(sheet.total_pasiva(), 200.0 + 300.0);
}

#[tokio::test]
async fn test_balance_sheet_error_envelope_reaches_the_caller() {
    init_tracing();
    let system = System::new(SystemConfig::default());
    system.attach_ledger(Arc::new(FakeLedger)).unwrap();

    let err = system
        .balance_sheet_service()
        .balance_sheet(1999)
        .await
        .unwrap_err();

    match err {
        simkeu_core::balance_sheet::BalanceSheetError::Request(RequestError::Rejected(app)) => {
            assert_eq!(app.code, 404);
            assert_eq!(app.message, "no ledger entries for 1999");
        }
        other => panic!("expected rejected request, got {other:?}"),
    }
}

#[tokio::test]
async fn test_balance_sheet_times_out_without_responder() {
    init_tracing();
    let config = SystemConfig {
        request_timeout: Duration::from_millis(100),
        ..SystemConfig::default()
    };
    let system = System::new(config);
    // No ledger attached: the original design hung forever here.

    let err = system
        .balance_sheet_service()
        .balance_sheet(2023)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        simkeu_core::balance_sheet::BalanceSheetError::Request(RequestError::Timeout(_))
    ));
}

#[tokio::test]
async fn test_honorarium_delete_cascades_into_salary_cancellation() {
    init_tracing();
    let system = System::new(SystemConfig::default());
    let salaries = Arc::new(FakeSalaries::new());
    system.attach_salary(salaries.clone()).unwrap();

    let fund_usages = Arc::new(FakeFundUsages::new("Honorarium Guru"));
    let service = system.fund_usage_service(fund_usages.clone());

    let deleted = service.delete("fu-1").await.unwrap();
    assert_eq!(deleted.id, "fu-1");
    assert_eq!(fund_usages.deletes.load(Ordering::SeqCst), 1);
    assert_eq!(salaries.cancellations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_operational_delete_does_not_cascade() {
    init_tracing();
    let system = System::new(SystemConfig::default());
    let salaries = Arc::new(FakeSalaries::new());
    system.attach_salary(salaries.clone()).unwrap();

    let fund_usages = Arc::new(FakeFundUsages::new("Operasional"));
    let service = system.fund_usage_service(fund_usages.clone());

    service.delete("fu-2").await.unwrap();
    assert_eq!(salaries.cancellations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_cascade_fails_the_delete_but_not_the_local_mutation() {
    init_tracing();
    let system = System::new(SystemConfig::default());
    let salaries = Arc::new(FakeSalaries::failing(AppError::not_found(
        "salary record not found",
    )));
    system.attach_salary(salaries.clone()).unwrap();

    let fund_usages = Arc::new(FakeFundUsages::new("HR"));
    let service = system.fund_usage_service(fund_usages.clone());

    let err = service.delete("fu-3").await.unwrap_err();
    match err {
        FundUsageError::Request(RequestError::Rejected(app)) => {
            assert_eq!(app.code, 404);
            assert_eq!(app.message, "salary record not found");
        }
        other => panic!("expected rejected cascade, got {other:?}"),
    }
    // The local delete already ran; nothing rolls it back.
    assert_eq!(fund_usages.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_shutdown_cancels_inflight_requests() {
    init_tracing();
    let system = Arc::new(System::new(SystemConfig::default()));
    // No ledger attached, so the request stays pending until shutdown.

    let waiting = tokio::spawn({
        let system = system.clone();
        async move { system.balance_sheet_service().balance_sheet(2023).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    system.shutdown().await;

    let err = waiting.await.unwrap().unwrap_err();
    match err {
        simkeu_core::balance_sheet::BalanceSheetError::Request(RequestError::Rejected(app)) => {
            assert_eq!(app.code, 503);
            assert_eq!(app.message, "request cancelled: system shutdown");
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
}
