use super::*;
use crate::config::ReconciliationConfig;
use crate::domain::batch::{BatchContainerRecord, BatchEntry};
use crate::domain::formula::{FillingStage, FormulaRecord};
use crate::domain::report::AuxiliaryDocumentCounts;
use crate::domain::types::{
    ComplianceRisk, MismatchType, RecommendationPriority, RecommendationType,
    ReconciliationStatus, Severity,
};
use chrono::{TimeZone, Utc};

// ==========================================
// 测试辅助函数
// ==========================================

/// 创建测试用的处方
fn create_test_formula(id: &str, main_code: &str, license: &str) -> FormulaRecord {
    FormulaRecord {
        formula_id: id.to_string(),
        master_card_no: format!("MFC-{}", id).as_str().into(),
        main_product_code: main_code.into(),
        product_name: "Paracetamol Tablets".into(),
        manufacturing_license_no: license.into(),
        ..Default::default()
    }
}

/// 创建测试用的批次条目
fn create_test_entry(batch_number: &str, item_code: &str, license: &str) -> BatchEntry {
    BatchEntry {
        batch_number: batch_number.into(),
        item_code: item_code.into(),
        item_name: format!("Item {}", item_code).as_str().into(),
        mfg_date: "2025-01-15".into(),
        batch_size: "1000".into(),
        mfg_lic_no: license.into(),
        ..Default::default()
    }
}

/// 创建测试用的批次容器文档
fn create_test_document(id: &str, entries: Vec<BatchEntry>) -> BatchContainerRecord {
    BatchContainerRecord {
        document_id: id.to_string(),
        department: "Oral Solids".into(),
        batch_type: "Export".into(),
        batches: entries,
        ..Default::default()
    }
}

fn run(formulas: &[FormulaRecord], documents: &[BatchContainerRecord]) -> crate::domain::ReconciliationReport {
    ReconciliationEngine::default().reconcile(formulas, documents)
}

// ==========================================
// 场景测试
// ==========================================

#[test]
fn test_scenario_a_matching_license_fully_reconciled() {
    let formulas = vec![create_test_formula("F1", "P100", "LIC1")];
    let documents = vec![create_test_document(
        "D1",
        vec![create_test_entry("B001", "P100", "LIC1")],
    )];

    let report = run(&formulas, &documents);

    let result = &report.formula_results[0];
    assert_eq!(result.reconciliation_status, ReconciliationStatus::FullyReconciled);
    assert!(result.batch_details[0].is_valid);
    assert_eq!(report.overall_stats.compliance_score, 100);
    assert_eq!(report.batch_reconciliation.reconciliation_percentage, 100);
}

#[test]
fn test_scenario_b_license_mismatch_not_reconciled() {
    let formulas = vec![create_test_formula("F1", "P100", "LIC1")];
    let documents = vec![create_test_document(
        "D1",
        vec![create_test_entry("B001", "P100", "LIC2")],
    )];

    let report = run(&formulas, &documents);

    let result = &report.formula_results[0];
    assert_eq!(result.reconciliation_status, ReconciliationStatus::NotReconciled);
    assert_eq!(result.mismatch_summary.mfc_mismatches, 1);
    let mismatches = &result.batch_details[0].mismatches;
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].mismatch_type, MismatchType::MfcMismatch);
    assert_eq!(mismatches[0].severity, Severity::Critical);
    assert_eq!(report.overall_stats.total_mfc_mismatches, 1);
    assert_eq!(report.overall_stats.compliance_score, 0);
}

#[test]
fn test_scenario_c_formula_without_batches() {
    let formulas = vec![
        create_test_formula("F1", "P100", "LIC1"),
        create_test_formula("F2", "P200", "LIC1"),
    ];
    let documents = vec![create_test_document(
        "D1",
        vec![create_test_entry("B001", "P100", "LIC1")],
    )];

    let report = run(&formulas, &documents);

    let f2 = report
        .formula_results
        .iter()
        .find(|r| r.formula_id == "F2")
        .unwrap();
    assert_eq!(f2.reconciliation_status, ReconciliationStatus::NoBatches);
    assert_eq!(report.overall_stats.formulas_with_no_batches, 1);
    assert_eq!(report.overall_stats.formulas_with_batches, 1);
    // 无批次处方不计入得分分母
    assert_eq!(report.overall_stats.compliance_score, 100);
}

#[test]
fn test_scenario_d_orphan_risk_levels() {
    let formulas = vec![create_test_formula("F1", "P100", "LIC1")];

    let few: Vec<BatchEntry> = (0..5)
        .map(|i| create_test_entry(&format!("X{}", i), "X999", "LIC1"))
        .collect();
    let report = run(&formulas, &[create_test_document("D1", few)]);
    assert_eq!(report.orphan_batches.len(), 1);
    assert_eq!(report.orphan_batches[0].item_code.as_str(), "X999");
    assert_eq!(report.orphan_batches[0].batch_count, 5);
    assert_eq!(report.orphan_batches[0].compliance_risk, ComplianceRisk::Medium);
    assert_eq!(report.orphan_batches[0].item_name.as_str(), "Item X999");
    assert_eq!(
        report.orphan_batches[0].reason,
        "No formula record found for item code X999"
    );

    let many: Vec<BatchEntry> = (0..6)
        .map(|i| create_test_entry(&format!("X{}", i), "X999", "LIC1"))
        .collect();
    let report = run(&formulas, &[create_test_document("D1", many)]);
    assert_eq!(report.orphan_batches[0].compliance_risk, ComplianceRisk::High);
    assert_eq!(report.recommendations.len(), 1);
    assert_eq!(
        report.recommendations[0].recommendation_type,
        RecommendationType::UrgentReview
    );
}

#[test]
fn test_scenario_e_mfc_correction_recommendation() {
    let formulas = vec![create_test_formula("F1", "P100", "LIC1")];
    let mut entries: Vec<BatchEntry> = (0..9)
        .map(|i| create_test_entry(&format!("B{:03}", i), "P100", "LIC1"))
        .collect();
    entries.push(create_test_entry("B900", "P100", "LIC2"));
    entries.push(create_test_entry("B901", "P100", "LIC3"));

    let report = run(&formulas, &[create_test_document("D1", entries)]);

    let result = &report.formula_results[0];
    assert_eq!(result.stats.total_batches, 11);
    assert_eq!(result.mismatch_summary.mfc_mismatches, 2);
    assert_eq!(result.reconciliation_status, ReconciliationStatus::PartiallyReconciled);

    let corrections: Vec<_> = report
        .recommendations
        .iter()
        .filter(|r| r.recommendation_type == RecommendationType::MfcCorrection)
        .collect();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].priority, RecommendationPriority::High);
    assert_eq!(corrections[0].target, "MFC-F1");
    assert_eq!(corrections[0].affected_batches, 2);
}

#[test]
fn test_ten_batches_do_not_trigger_mfc_correction() {
    let formulas = vec![create_test_formula("F1", "P100", "LIC1")];
    let entries: Vec<BatchEntry> = (0..10)
        .map(|i| create_test_entry(&format!("B{}", i), "P100", "LIC2"))
        .collect();
    let report = run(&formulas, &[create_test_document("D1", entries)]);
    assert!(report.recommendations.is_empty());
}

// ==========================================
// 性质测试
// ==========================================

#[test]
fn test_accounting_invariant() {
    let formulas = vec![
        create_test_formula("F1", "P100", "LIC1"),
        create_test_formula("F2", "P200", "LIC1"),
    ];
    let documents = vec![
        create_test_document(
            "D1",
            vec![
                create_test_entry("B1", "P100", "LIC1"),
                create_test_entry("B2", "Q1", "LIC1"),
                BatchEntry::default(),
            ],
        ),
        create_test_document(
            "D2",
            vec![
                create_test_entry("B3", "P200", "LIC9"),
                create_test_entry("B4", "Q1", "LIC1"),
            ],
        ),
    ];

    let report = run(&formulas, &documents);
    let summary = &report.batch_reconciliation;
    assert_eq!(summary.total_batches, 5);
    assert_eq!(summary.batches_matched_to_formula, 2);
    assert_eq!(summary.batches_not_matched_to_formula, 3);
    assert!(summary.all_batches_accounted_for);
    assert_eq!(report.data_sources.batch_line_items, 5);
    assert_eq!(report.data_sources.batch_documents, 2);
    // 1 个已对账 / 5 个批次 -> 20
    assert_eq!(summary.reconciliation_percentage, 20);
}

#[test]
fn test_filling_code_resolves_to_first_formula() {
    let mut first = create_test_formula("F1", "P100", "LIC1");
    first.filling_stages.push(FillingStage {
        product_code: "SHARED".into(),
        ..Default::default()
    });
    let mut second = create_test_formula("F2", "P200", "LIC1");
    second.filling_stages.push(FillingStage {
        product_code: "SHARED".into(),
        ..Default::default()
    });

    let documents = vec![create_test_document(
        "D1",
        vec![create_test_entry("B1", "SHARED", "LIC1")],
    )];
    let report = run(&[first, second], &documents);

    let f1 = report.formula_results.iter().find(|r| r.formula_id == "F1").unwrap();
    let f2 = report.formula_results.iter().find(|r| r.formula_id == "F2").unwrap();
    assert_eq!(f1.stats.total_batches, 1);
    assert_eq!(f2.stats.total_batches, 0);
}

#[test]
fn test_idempotent_except_timestamp() {
    let formulas = vec![
        create_test_formula("F1", "P100", "LIC1"),
        create_test_formula("F2", "P200", "LIC1"),
    ];
    let documents = vec![create_test_document(
        "D1",
        vec![
            create_test_entry("B1", "P100", "LIC2"),
            create_test_entry("B2", "P200", "LIC1"),
            create_test_entry("B3", "X1", "LIC1"),
        ],
    )];
    let engine = ReconciliationEngine::default();
    let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap();

    let mut a = engine.reconcile_at(&formulas, &documents, AuxiliaryDocumentCounts::default(), t1);
    let b = engine.reconcile_at(&formulas, &documents, AuxiliaryDocumentCounts::default(), t2);
    assert_ne!(a.report_id, b.report_id);

    a.generated_at = b.generated_at;
    a.report_id = b.report_id.clone();
    assert_eq!(a, b);
}

#[test]
fn test_report_id_derived_from_generation_time() {
    let engine = ReconciliationEngine::default();
    let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
    let report = engine.reconcile_at(&[], &[], AuxiliaryDocumentCounts::default(), at);
    assert_eq!(report.generated_at, at);
    assert_eq!(report.report_id, format!("RECON-{}", at.timestamp_millis()));
    assert_eq!(report.overall_stats.compliance_score, 100);
    assert_eq!(report.batch_reconciliation.reconciliation_percentage, 100);
}

#[test]
fn test_formula_results_sorted_by_total_batches() {
    let formulas = vec![
        create_test_formula("F1", "P100", "LIC1"),
        create_test_formula("F2", "P200", "LIC1"),
        create_test_formula("F3", "P300", "LIC1"),
    ];
    let documents = vec![create_test_document(
        "D1",
        vec![
            create_test_entry("B1", "P200", "LIC1"),
            create_test_entry("B2", "P300", "LIC1"),
            create_test_entry("B3", "P300", "LIC1"),
        ],
    )];
    let report = run(&formulas, &documents);
    let order: Vec<&str> = report
        .formula_results
        .iter()
        .map(|r| r.formula_id.as_str())
        .collect();
    assert_eq!(order, vec!["F3", "F2", "F1"]);
}

#[test]
fn test_recommendations_fixed_order() {
    // 7 个无批次处方 + 1 个 11 批次含 MFC 差异处方 + 6 批次孤儿
    let mut formulas = vec![create_test_formula("BIG", "P100", "LIC1")];
    for i in 0..7 {
        formulas.push(create_test_formula(&format!("E{}", i), &format!("E{}", i), "LIC1"));
    }
    let mut entries: Vec<BatchEntry> = (0..11)
        .map(|i| create_test_entry(&format!("B{}", i), "P100", if i == 0 { "LIC2" } else { "LIC1" }))
        .collect();
    entries.extend((0..6).map(|i| create_test_entry(&format!("O{}", i), "ORPHAN", "LIC1")));

    let report = run(&formulas, &[create_test_document("D1", entries)]);
    let kinds: Vec<RecommendationType> = report
        .recommendations
        .iter()
        .map(|r| r.recommendation_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            RecommendationType::MfcCorrection,
            RecommendationType::UrgentReview,
            RecommendationType::FormulaCleanup,
        ]
    );
    let cleanup = report.recommendations.last().unwrap();
    assert_eq!(cleanup.priority, RecommendationPriority::Low);
    assert!(cleanup.description.starts_with("7 formulas"));
}

#[test]
fn test_urgent_review_limited_to_top_orphans() {
    let formulas = vec![create_test_formula("F1", "P100", "LIC1")];
    let mut entries = Vec::new();
    for code in 0..7 {
        for i in 0..(6 + code) {
            entries.push(create_test_entry(&format!("{}-{}", code, i), &format!("X{}", code), "LIC1"));
        }
    }
    let report = run(&formulas, &[create_test_document("D1", entries)]);
    let targets: Vec<&str> = report
        .recommendations
        .iter()
        .map(|r| r.target.as_str())
        .collect();
    assert_eq!(targets, vec!["X6", "X5", "X4", "X3", "X2"]);
}

#[test]
fn test_rule_coverage_reports_unevaluated_rules() {
    let report = run(&[], &[]);
    let evaluated: Vec<(MismatchType, bool)> = report
        .rule_coverage
        .iter()
        .map(|c| (c.rule, c.evaluated))
        .collect();
    assert_eq!(
        evaluated,
        vec![
            (MismatchType::RevisionMismatch, false),
            (MismatchType::MfcMismatch, true),
            (MismatchType::MaterialMismatch, false),
            (MismatchType::ObsoleteFormula, false),
        ]
    );
}

#[test]
fn test_chinese_report_locale() {
    let engine = ReconciliationEngine::new(ReconciliationConfig {
        report_locale: "zh-CN".to_string(),
        ..Default::default()
    });
    let formulas = vec![create_test_formula("F1", "P100", "LIC1")];
    let report = engine.reconcile(&formulas, &[]);
    assert_eq!(report.formula_results[0].compliance_notes, vec!["未找到批次记录".to_string()]);
}

#[test]
fn test_auxiliary_counts_in_data_sources() {
    let engine = ReconciliationEngine::default();
    let report = engine.reconcile_at(
        &[],
        &[],
        AuxiliaryDocumentCounts {
            coa_documents: 4,
            material_requisitions: 2,
        },
        Utc::now(),
    );
    assert_eq!(report.data_sources.coa_documents, 4);
    assert_eq!(report.data_sources.material_requisitions, 2);
}

#[test]
fn test_formula_result_lookup_by_id() {
    let formulas = vec![create_test_formula("F1", "P100", "LIC1")];
    let report = run(&formulas, &[]);
    assert_eq!(report.formula_result_by_id("F1").unwrap().formula_id, "F1");
    assert!(report.formula_result_by_id("F9").is_none());
}

#[test]
fn test_report_serializes_camel_case() {
    let formulas = vec![create_test_formula("F1", "P100", "LIC1")];
    let report = run(&formulas, &[]);
    let json = serde_json::to_value(&report).unwrap();
    assert!(json.get("reportId").is_some());
    assert_eq!(json["overallStats"]["complianceScore"], 100);
    assert_eq!(json["formulaResults"][0]["reconciliationStatus"], "no_batches");
    assert_eq!(json["batchReconciliation"]["allBatchesAccountedFor"], true);
}
