// ==========================================
// 药品批记录对账引擎 - 对账结果实体
// ==========================================
// 职责: 单批次校验结果、处方汇总、孤儿批次
// 红线: 结果对象创建后不再修改
// ==========================================

use crate::domain::batch::BatchLineItem;
use crate::domain::types::{
    BatchStatus, BatchType, ComplianceRisk, MismatchType, ReconciliationStatus, Recorded,
    RevisionMatch, Severity,
};
use serde::{Deserialize, Serialize};

// ==========================================
// Mismatch - 单条差异
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mismatch {
    #[serde(rename = "type")]
    pub mismatch_type: MismatchType,
    pub description: String,
    pub severity: Severity,
}

// ==========================================
// BatchValidationResult - 单批次校验结果
// ==========================================
// 不变量: is_valid == mismatches.is_empty()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValidationResult {
    pub batch_number: Recorded<String>,
    pub item_code: Recorded<String>,
    pub item_name: Recorded<String>,
    pub mfg_date: Recorded<String>,
    pub expiry_date: Recorded<String>,
    pub batch_size: Recorded<String>,
    pub department: Recorded<String>,
    #[serde(rename = "type")]
    pub batch_type: BatchType,
    pub mfg_lic_no: Recorded<String>,
    pub status: BatchStatus,

    pub is_valid: bool,
    pub formula_exists: bool,
    pub revision_match: RevisionMatch,
    pub mfc_match: bool,
    pub material_match: bool,
    pub obsolete_formula_used: bool,
    pub mismatches: Vec<Mismatch>,
}

impl BatchValidationResult {
    /// 由规则产出的差异列表构造结果,各标志位从差异派生
    pub fn from_mismatches(batch: &BatchLineItem, mismatches: Vec<Mismatch>) -> Self {
        let has = |kind: MismatchType| mismatches.iter().any(|m| m.mismatch_type == kind);

        let revision_match = if has(MismatchType::RevisionMismatch) {
            RevisionMatch::InvalidRevision
        } else {
            RevisionMatch::Valid
        };
        let mfc_match = !has(MismatchType::MfcMismatch);
        let material_match = !has(MismatchType::MaterialMismatch);
        let obsolete_formula_used = has(MismatchType::ObsoleteFormula);

        Self {
            batch_number: batch.batch_number.clone(),
            item_code: batch.item_code.clone(),
            item_name: batch.item_name.clone(),
            mfg_date: batch.mfg_date.clone(),
            expiry_date: batch.expiry_date.clone(),
            batch_size: batch.batch_size.clone(),
            department: batch.department.clone(),
            batch_type: batch.batch_type,
            mfg_lic_no: batch.mfg_lic_no.clone(),
            status: batch.status,
            is_valid: mismatches.is_empty(),
            formula_exists: true,
            revision_match,
            mfc_match,
            material_match,
            obsolete_formula_used,
            mismatches,
        }
    }

    pub fn has_mismatch(&self, kind: MismatchType) -> bool {
        self.mismatches.iter().any(|m| m.mismatch_type == kind)
    }
}

// ==========================================
// FormulaStats - 处方批次统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaStats {
    pub total_batches: usize,
    pub batches_in_use: usize,
    pub cancelled_batches: usize,
    pub rejected_batches: usize,
    pub reconciled_batches: usize,
    pub mismatched_batches: usize,
}

// ==========================================
// MismatchSummary - 差异分类计数
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MismatchSummary {
    pub revision_mismatches: usize,
    pub mfc_mismatches: usize,
    pub material_mismatches: usize,
    pub obsolete_formula_used: usize,
}

impl MismatchSummary {
    /// 按批次计数 (同一批次同类差异只计一次)
    pub fn from_results(results: &[BatchValidationResult]) -> Self {
        let count = |kind: MismatchType| results.iter().filter(|r| r.has_mismatch(kind)).count();
        Self {
            revision_mismatches: count(MismatchType::RevisionMismatch),
            mfc_mismatches: count(MismatchType::MfcMismatch),
            material_mismatches: count(MismatchType::MaterialMismatch),
            obsolete_formula_used: count(MismatchType::ObsoleteFormula),
        }
    }
}

// ==========================================
// FormulaReconciliationResult - 处方对账汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaReconciliationResult {
    pub formula_id: String,
    pub master_card_no: Recorded<String>,
    pub main_product_code: Recorded<String>,
    pub product_name: Recorded<String>,
    pub generic_name: Recorded<String>,
    pub manufacturer: Recorded<String>,
    pub revision_no: Recorded<String>,
    pub manufacturing_license_no: Recorded<String>,

    pub stats: FormulaStats,
    pub mismatch_summary: MismatchSummary,
    pub reconciliation_status: ReconciliationStatus,
    pub linked_product_codes: Vec<String>,
    pub batch_details: Vec<BatchValidationResult>,
    pub compliance_notes: Vec<String>,
}

// ==========================================
// 孤儿批次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanBatchEntry {
    pub batch_number: Recorded<String>,
    pub mfg_date: Recorded<String>,
    pub batch_size: Recorded<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanBatchResult {
    pub item_code: Recorded<String>,
    /// 取首次出现的品名
    pub item_name: Recorded<String>,
    pub batch_count: usize,
    pub batches: Vec<OrphanBatchEntry>,
    pub compliance_risk: ComplianceRisk,
    pub reason: String,
}
