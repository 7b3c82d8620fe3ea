// ==========================================
// 药品批记录对账引擎 - 对账报告
// ==========================================
// 职责: 最终输出对象 (每次调用新建,不可变,本引擎不落库)
// ==========================================

use crate::domain::reconciliation::{FormulaReconciliationResult, OrphanBatchResult};
use crate::domain::types::{MismatchType, RecommendationPriority, RecommendationType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 数据来源计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSources {
    pub formula_records: usize,
    pub batch_documents: usize,
    pub batch_line_items: usize,
    pub coa_documents: usize,
    pub material_requisitions: usize,
}

/// 辅助文档计数 (检验报告 / 领料单),由数据源提供
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuxiliaryDocumentCounts {
    pub coa_documents: usize,
    pub material_requisitions: usize,
}

/// 规则覆盖情况 (未评估的规则如实列出)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCoverage {
    pub rule: MismatchType,
    pub evaluated: bool,
}

/// 全局批次核算
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReconciliationSummary {
    pub total_batches: usize,
    pub batches_matched_to_formula: usize,
    pub batches_not_matched_to_formula: usize,
    pub all_batches_accounted_for: bool,
    pub reconciled_batches: usize,
    pub mismatched_batches: usize,
    pub reconciliation_percentage: u32,
}

/// 全局处方统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_formulas: usize,
    pub fully_reconciled: usize,
    pub partially_reconciled: usize,
    pub not_reconciled: usize,
    pub formulas_with_no_batches: usize,
    pub formulas_with_batches: usize,
    pub total_mfc_mismatches: usize,
    pub orphan_item_codes: usize,
    pub orphan_batches: usize,
    /// 0..=100
    pub compliance_score: u32,
}

/// 整改建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    /// 处方卡号或品目编码
    pub target: String,
    pub description: String,
    pub affected_batches: usize,
}

// ==========================================
// ReconciliationReport - 对账报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub generated_at: DateTime<Utc>,
    pub report_id: String,
    pub data_sources: DataSources,
    pub batch_reconciliation: BatchReconciliationSummary,
    /// 按批次总数降序
    pub formula_results: Vec<FormulaReconciliationResult>,
    /// 按批次数降序
    pub orphan_batches: Vec<OrphanBatchResult>,
    pub overall_stats: OverallStats,
    pub recommendations: Vec<Recommendation>,
    pub rule_coverage: Vec<RuleCoverage>,
}

impl ReconciliationReport {
    /// 报告编号由生成时间派生
    pub fn report_id_for(generated_at: DateTime<Utc>) -> String {
        format!("RECON-{}", generated_at.timestamp_millis())
    }

    /// 按处方标识查询处方结果
    ///
    /// 处方卡号需先经 FormulaIndex 解析为处方标识
    pub fn formula_result_by_id(&self, formula_id: &str) -> Option<&FormulaReconciliationResult> {
        self.formula_results
            .iter()
            .find(|result| result.formula_id == formula_id)
    }
}
