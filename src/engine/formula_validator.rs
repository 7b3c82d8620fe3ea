// ==========================================
// 药品批记录对账引擎 - 处方级校验
// ==========================================
// 输入: 单个处方 + 其匹配批次
// 输出: FormulaReconciliationResult (含逐批校验结果)
// ==========================================
// 红线: 无批次的处方同样产出结果 (no_batches)
// ==========================================

use crate::domain::batch::BatchLineItem;
use crate::domain::formula::FormulaRecord;
use crate::domain::reconciliation::{
    BatchValidationResult, FormulaReconciliationResult, FormulaStats, MismatchSummary,
};
use crate::domain::types::{BatchStatus, ReconciliationStatus};
use crate::engine::rules::{default_rules, run_rules, BatchRule};
use crate::i18n::{t_in, DEFAULT_LOCALE};
use tracing::{debug, warn};

// ==========================================
// FormulaValidator - 处方校验器
// ==========================================
pub struct FormulaValidator {
    rules: Vec<Box<dyn BatchRule>>,
    locale: String,
}

impl FormulaValidator {
    /// 默认规则集
    pub fn new(locale: &str) -> Self {
        Self::with_rules(default_rules(), locale)
    }

    pub fn with_rules(rules: Vec<Box<dyn BatchRule>>, locale: &str) -> Self {
        Self {
            rules,
            locale: locale.to_string(),
        }
    }

    pub fn rules(&self) -> &[Box<dyn BatchRule>] {
        &self.rules
    }

    /// 校验单个批次
    pub fn validate_batch(&self, batch: &BatchLineItem, formula: &FormulaRecord) -> BatchValidationResult {
        let mismatches = run_rules(&self.rules, batch, formula, &self.locale);
        BatchValidationResult::from_mismatches(batch, mismatches)
    }

    /// 校验处方及其全部匹配批次
    pub fn validate_formula(
        &self,
        formula: &FormulaRecord,
        batches: &[BatchLineItem],
    ) -> FormulaReconciliationResult {
        let batch_details: Vec<BatchValidationResult> = batches
            .iter()
            .map(|batch| self.validate_batch(batch, formula))
            .collect();

        let stats = Self::compute_stats(&batch_details);
        let mismatch_summary = MismatchSummary::from_results(&batch_details);
        let reconciliation_status = ReconciliationStatus::classify(
            stats.total_batches,
            stats.reconciled_batches,
            stats.mismatched_batches,
        );
        let compliance_notes = self.compliance_notes(&stats, &mismatch_summary);

        if mismatch_summary.mfc_mismatches > 0 {
            warn!(
                formula_id = %formula.formula_id,
                master_card_no = %formula.master_card_no,
                mfc_mismatches = mismatch_summary.mfc_mismatches,
                "处方存在许可证不一致批次"
            );
        }

        debug!(
            formula_id = %formula.formula_id,
            total_batches = stats.total_batches,
            reconciled = stats.reconciled_batches,
            mismatched = stats.mismatched_batches,
            status = %reconciliation_status,
            "处方校验完成"
        );

        FormulaReconciliationResult {
            formula_id: formula.formula_id.clone(),
            master_card_no: formula.master_card_no.clone(),
            main_product_code: formula.main_product_code.clone(),
            product_name: formula.product_name.clone(),
            generic_name: formula.generic_name.clone(),
            manufacturer: formula.manufacturer.clone(),
            revision_no: formula.revision_no.clone(),
            manufacturing_license_no: formula.manufacturing_license_no.clone(),
            stats,
            mismatch_summary,
            reconciliation_status,
            linked_product_codes: formula.linked_product_codes(),
            batch_details,
            compliance_notes,
        }
    }

    /// 批次统计
    fn compute_stats(results: &[BatchValidationResult]) -> FormulaStats {
        let mut stats = FormulaStats {
            total_batches: results.len(),
            ..Default::default()
        };

        for result in results {
            match result.status {
                BatchStatus::Cancelled => stats.cancelled_batches += 1,
                BatchStatus::Rejected => stats.rejected_batches += 1,
                BatchStatus::InUse | BatchStatus::Unknown => stats.batches_in_use += 1,
            }

            if result.is_valid {
                stats.reconciled_batches += 1;
            } else {
                stats.mismatched_batches += 1;
            }
        }

        stats
    }

    /// 合规备注 (固定顺序)
    fn compliance_notes(&self, stats: &FormulaStats, summary: &MismatchSummary) -> Vec<String> {
        let mut notes = Vec::new();

        if stats.total_batches == 0 {
            notes.push(t_in(&self.locale, "recon.note.no_batches", &[]));
            return notes;
        }

        if summary.mfc_mismatches > 0 {
            notes.push(t_in(
                &self.locale,
                "recon.note.mfc_mismatch",
                &[("count", &summary.mfc_mismatches.to_string())],
            ));
        }

        if stats.reconciled_batches == stats.total_batches {
            notes.push(t_in(&self.locale, "recon.note.fully_reconciled", &[]));
        }

        notes
    }
}

impl Default for FormulaValidator {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}
