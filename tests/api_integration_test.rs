// ==========================================
// ReconciliationApi 集成测试
// ==========================================
// 测试目标: 数据源 -> 引擎 -> 报告 的端到端流程,失败时不产出报告
// ==========================================

mod test_helpers;

use std::sync::Arc;

use async_trait::async_trait;
use pharma_batch_recon::api::{ApiError, ReconciliationApi};
use pharma_batch_recon::config::ReconciliationConfig;
use pharma_batch_recon::domain::{
    AuxiliaryDocumentCounts, BatchContainerRecord, ComplianceRisk, FormulaRecord, MismatchType,
    ReconciliationStatus,
};
use pharma_batch_recon::repository::{
    InMemoryDataSource, ReconciliationDataSource, RepositoryError, RepositoryResult,
    SqliteDataSource,
};
use test_helpers::*;

/// 批次读取必定失败的数据源
struct FailingBatchSource;

#[async_trait]
impl ReconciliationDataSource for FailingBatchSource {
    async fn list_all_formulas(&self) -> RepositoryResult<Vec<FormulaRecord>> {
        Ok(vec![create_test_formula("F1", "P100", "LIC1")])
    }

    async fn list_all_batch_documents(&self) -> RepositoryResult<Vec<BatchContainerRecord>> {
        Err(RepositoryError::DatabaseConnectionError("batch store offline".to_string()))
    }

    async fn count_auxiliary_documents(&self) -> RepositoryResult<AuxiliaryDocumentCounts> {
        Ok(AuxiliaryDocumentCounts::default())
    }
}

#[tokio::test]
async fn test_generate_report_from_sqlite() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let source = SqliteDataSource::from_connection(open_shared_connection(&db_path).unwrap());

    source
        .formula_repository()
        .insert_batch(&[
            create_test_formula_with_stages("F1", "P100", "LIC1", &["P100-10"], &[]),
            create_test_formula("F2", "P200", "LIC1"),
        ])
        .unwrap();
    source
        .batch_repository()
        .insert_batch(&[create_test_document(
            "DOC-1",
            vec![
                create_test_entry("B1", "P100", "LIC1"),
                create_test_entry("B2", "P100-10", "LIC2"),
                create_test_entry("B3", "X999", "LIC1"),
            ],
        )])
        .unwrap();
    source
        .batch_repository()
        .insert_coa_document("COA-1", Some("B1"), Some("P100"))
        .unwrap();

    let api = ReconciliationApi::new(Arc::new(source), ReconciliationConfig::default()).unwrap();
    let report = api.generate_report().await.unwrap();

    assert_eq!(report.data_sources.formula_records, 2);
    assert_eq!(report.data_sources.batch_documents, 1);
    assert_eq!(report.data_sources.batch_line_items, 3);
    assert_eq!(report.data_sources.coa_documents, 1);
    assert!(report.batch_reconciliation.all_batches_accounted_for);

    let f1 = report.formula_result_by_id("F1").unwrap();
    assert_eq!(f1.stats.total_batches, 2);
    assert_eq!(f1.reconciliation_status, ReconciliationStatus::PartiallyReconciled);
    assert_eq!(f1.linked_product_codes, vec!["P100".to_string(), "P100-10".to_string()]);
    let mismatched = f1
        .batch_details
        .iter()
        .find(|b| b.batch_number.as_str() == "B2")
        .unwrap();
    assert_eq!(mismatched.mismatches[0].mismatch_type, MismatchType::MfcMismatch);

    assert_eq!(report.orphan_batches.len(), 1);
    assert_eq!(report.orphan_batches[0].compliance_risk, ComplianceRisk::Medium);
    // F1 部分对账 (0.5) / 有批次处方 1 -> 50
    assert_eq!(report.overall_stats.compliance_score, 50);
}

#[tokio::test]
async fn test_formula_result_lookup() {
    let source = InMemoryDataSource::new(
        vec![create_test_formula("F1", "P100", "LIC1")],
        vec![create_test_document(
            "DOC-1",
            vec![create_test_entry("B1", "P100", "LIC1")],
        )],
    );
    let api = ReconciliationApi::new(Arc::new(source), ReconciliationConfig::default()).unwrap();

    let result = api.formula_result("MFC-F1").await.unwrap();
    assert_eq!(result.reconciliation_status, ReconciliationStatus::FullyReconciled);

    assert!(matches!(
        api.formula_result("MFC-NOPE").await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        api.formula_result("  ").await,
        Err(ApiError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_duplicate_master_card_resolves_to_last_registered_formula() {
    // F1 批次多、排序在前,但重复卡号由后登记的 F2 持有
    let mut f1 = create_test_formula("F1", "P100", "LIC1");
    f1.master_card_no = "MFC-DUP".into();
    let mut f2 = create_test_formula("F2", "P200", "LIC1");
    f2.master_card_no = "MFC-DUP".into();

    let source = InMemoryDataSource::new(
        vec![f1, f2],
        vec![create_test_document(
            "DOC-1",
            (0..3)
                .map(|i| create_test_entry(&format!("B{}", i), "P100", "LIC1"))
                .collect(),
        )],
    );
    let api = ReconciliationApi::new(Arc::new(source), ReconciliationConfig::default()).unwrap();

    let report = api.generate_report().await.unwrap();
    assert_eq!(report.formula_results[0].formula_id, "F1");

    let result = api.formula_result(" MFC-DUP ").await.unwrap();
    assert_eq!(result.formula_id, "F2");
    assert_eq!(result.stats.total_batches, 0);
    assert_eq!(result.reconciliation_status, ReconciliationStatus::NoBatches);
}

#[tokio::test]
async fn test_fetch_failure_yields_no_report() {
    let api = ReconciliationApi::new(Arc::new(FailingBatchSource), ReconciliationConfig::default())
        .unwrap();

    let err = api.generate_report().await.unwrap_err();
    assert!(matches!(err, ApiError::DatabaseConnectionError(_)));
    assert!(err.to_string().contains("batch store offline"));
}

#[tokio::test]
async fn test_invalid_config_rejected_at_construction() {
    let config = ReconciliationConfig {
        report_locale: "fr".to_string(),
        ..Default::default()
    };
    let result = ReconciliationApi::new(Arc::new(InMemoryDataSource::default()), config);
    assert!(matches!(result, Err(ApiError::ConfigurationError(_))));
}

#[tokio::test]
async fn test_empty_sources_produce_full_score() {
    let api = ReconciliationApi::new(
        Arc::new(InMemoryDataSource::default()),
        ReconciliationConfig::default(),
    )
    .unwrap();
    let report = api.generate_report().await.unwrap();

    assert_eq!(report.overall_stats.compliance_score, 100);
    assert_eq!(report.batch_reconciliation.reconciliation_percentage, 100);
    assert!(report.formula_results.is_empty());
    assert!(report.recommendations.is_empty());
}

#[tokio::test]
async fn test_concurrent_report_generation() {
    let source = InMemoryDataSource::new(
        vec![create_test_formula("F1", "P100", "LIC1")],
        vec![create_test_document(
            "DOC-1",
            vec![create_test_entry("B1", "P100", "LIC2")],
        )],
    );
    let api = Arc::new(
        ReconciliationApi::new(Arc::new(source), ReconciliationConfig::default()).unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let api = api.clone();
            tokio::spawn(async move { api.generate_report().await })
        })
        .collect();

    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.overall_stats.total_mfc_mismatches, 1);
        assert_eq!(report.overall_stats.compliance_score, 0);
    }
}
