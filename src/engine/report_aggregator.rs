// ==========================================
// 药品批记录对账引擎 - 报告汇总
// ==========================================
// 输入: 处方对账结果 (已排序) + 孤儿批次分组 + 扁平批次总数
// 输出: 全局统计、合规得分、孤儿批次结果、整改建议
// ==========================================
// 红线: 建议按固定顺序生成 (a -> b -> c),不重新排序
// ==========================================

use crate::config::ReconciliationConfig;
use crate::domain::reconciliation::{FormulaReconciliationResult, OrphanBatchEntry, OrphanBatchResult};
use crate::domain::report::{BatchReconciliationSummary, OverallStats, Recommendation};
use crate::domain::types::{
    ComplianceRisk, RecommendationPriority, RecommendationType, ReconciliationStatus,
};
use crate::engine::batch_matcher::OrphanGroup;
use crate::i18n::t_in;
use tracing::{debug, info};

/// 汇总阶段输出
#[derive(Debug, Clone)]
pub struct AggregateSummary {
    pub overall_stats: OverallStats,
    pub batch_reconciliation: BatchReconciliationSummary,
    pub orphan_batches: Vec<OrphanBatchResult>,
    pub recommendations: Vec<Recommendation>,
}

/// 百分比取整 (分母为 0 时视为 100)
fn rounded_percentage(numerator: f64, denominator: usize) -> u32 {
    if denominator == 0 {
        return 100;
    }
    (100.0 * numerator / denominator as f64).round().clamp(0.0, 100.0) as u32
}

/// 合规得分: (完全对账 + 0.5 * 部分对账) / 有批次处方数
pub fn compliance_score(fully: usize, partially: usize, formulas_with_batches: usize) -> u32 {
    rounded_percentage(fully as f64 + 0.5 * partially as f64, formulas_with_batches)
}

// ==========================================
// ReportAggregator - 报告汇总器
// ==========================================
pub struct ReportAggregator<'c> {
    config: &'c ReconciliationConfig,
}

impl<'c> ReportAggregator<'c> {
    pub fn new(config: &'c ReconciliationConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(
        &self,
        formula_results: &[FormulaReconciliationResult],
        orphan_groups: &[OrphanGroup],
        total_batch_items: usize,
    ) -> AggregateSummary {
        let orphan_batches = self.build_orphan_results(orphan_groups);
        let overall_stats = self.overall_stats(formula_results, &orphan_batches);
        let batch_reconciliation =
            Self::batch_reconciliation(formula_results, &orphan_batches, total_batch_items);
        let recommendations = self.recommendations(formula_results, &orphan_batches, &overall_stats);

        info!(
            total_formulas = overall_stats.total_formulas,
            compliance_score = overall_stats.compliance_score,
            total_batches = batch_reconciliation.total_batches,
            all_batches_accounted_for = batch_reconciliation.all_batches_accounted_for,
            recommendations = recommendations.len(),
            "报告汇总完成"
        );

        AggregateSummary {
            overall_stats,
            batch_reconciliation,
            orphan_batches,
            recommendations,
        }
    }

    /// 孤儿批次结果 (按批次数降序,同数保持首次出现顺序)
    fn build_orphan_results(&self, groups: &[OrphanGroup]) -> Vec<OrphanBatchResult> {
        let mut results: Vec<OrphanBatchResult> = groups
            .iter()
            .map(|group| {
                let batch_count = group.batches.len();
                let compliance_risk = if batch_count > self.config.orphan_high_risk_threshold {
                    ComplianceRisk::High
                } else {
                    ComplianceRisk::Medium
                };
                OrphanBatchResult {
                    item_code: group.item_code.clone(),
                    item_name: group
                        .batches
                        .first()
                        .map(|b| b.item_name.clone())
                        .unwrap_or_default(),
                    batch_count,
                    batches: group
                        .batches
                        .iter()
                        .map(|b| OrphanBatchEntry {
                            batch_number: b.batch_number.clone(),
                            mfg_date: b.mfg_date.clone(),
                            batch_size: b.batch_size.clone(),
                        })
                        .collect(),
                    compliance_risk,
                    reason: t_in(
                        &self.config.report_locale,
                        "recon.orphan.reason",
                        &[("item_code", group.item_code.as_str())],
                    ),
                }
            })
            .collect();

        results.sort_by(|a, b| b.batch_count.cmp(&a.batch_count));
        results
    }

    fn overall_stats(
        &self,
        formula_results: &[FormulaReconciliationResult],
        orphan_batches: &[OrphanBatchResult],
    ) -> OverallStats {
        let count_status = |status: ReconciliationStatus| {
            formula_results
                .iter()
                .filter(|r| r.reconciliation_status == status)
                .count()
        };

        let fully_reconciled = count_status(ReconciliationStatus::FullyReconciled);
        let partially_reconciled = count_status(ReconciliationStatus::PartiallyReconciled);
        let not_reconciled = count_status(ReconciliationStatus::NotReconciled);
        let formulas_with_no_batches = count_status(ReconciliationStatus::NoBatches);
        let formulas_with_batches = formula_results.len() - formulas_with_no_batches;

        OverallStats {
            total_formulas: formula_results.len(),
            fully_reconciled,
            partially_reconciled,
            not_reconciled,
            formulas_with_no_batches,
            formulas_with_batches,
            total_mfc_mismatches: formula_results
                .iter()
                .map(|r| r.mismatch_summary.mfc_mismatches)
                .sum(),
            orphan_item_codes: orphan_batches.len(),
            orphan_batches: orphan_batches.iter().map(|o| o.batch_count).sum(),
            compliance_score: compliance_score(
                fully_reconciled,
                partially_reconciled,
                formulas_with_batches,
            ),
        }
    }

    fn batch_reconciliation(
        formula_results: &[FormulaReconciliationResult],
        orphan_batches: &[OrphanBatchResult],
        total_batch_items: usize,
    ) -> BatchReconciliationSummary {
        let batches_matched_to_formula: usize =
            formula_results.iter().map(|r| r.stats.total_batches).sum();
        let batches_not_matched_to_formula: usize =
            orphan_batches.iter().map(|o| o.batch_count).sum();
        let reconciled_batches: usize =
            formula_results.iter().map(|r| r.stats.reconciled_batches).sum();
        let mismatched_batches: usize =
            formula_results.iter().map(|r| r.stats.mismatched_batches).sum();

        BatchReconciliationSummary {
            total_batches: total_batch_items,
            batches_matched_to_formula,
            batches_not_matched_to_formula,
            all_batches_accounted_for: batches_matched_to_formula + batches_not_matched_to_formula
                == total_batch_items,
            reconciled_batches,
            mismatched_batches,
            reconciliation_percentage: rounded_percentage(
                reconciled_batches as f64,
                total_batch_items,
            ),
        }
    }

    /// 整改建议: (a) 许可证更正 -> (b) 孤儿批次紧急复核 -> (c) 处方清理
    fn recommendations(
        &self,
        formula_results: &[FormulaReconciliationResult],
        orphan_batches: &[OrphanBatchResult],
        overall_stats: &OverallStats,
    ) -> Vec<Recommendation> {
        let locale = self.config.report_locale.as_str();
        let mut recommendations = Vec::new();

        for result in formula_results {
            let mfc_mismatches = result.mismatch_summary.mfc_mismatches;
            if result.stats.total_batches > self.config.mfc_correction_min_batches
                && mfc_mismatches > 0
            {
                let target = result
                    .master_card_no
                    .known()
                    .cloned()
                    .unwrap_or_else(|| result.formula_id.clone());
                recommendations.push(Recommendation {
                    priority: RecommendationPriority::High,
                    recommendation_type: RecommendationType::MfcCorrection,
                    description: t_in(
                        locale,
                        "recon.recommendation.mfc_correction",
                        &[
                            ("master_card", &target),
                            ("count", &mfc_mismatches.to_string()),
                            ("total", &result.stats.total_batches.to_string()),
                        ],
                    ),
                    target,
                    affected_batches: mfc_mismatches,
                });
            }
        }

        for orphan in orphan_batches
            .iter()
            .take(self.config.urgent_review_top_n)
            .filter(|o| o.batch_count > self.config.urgent_review_min_batches)
        {
            recommendations.push(Recommendation {
                priority: RecommendationPriority::High,
                recommendation_type: RecommendationType::UrgentReview,
                target: orphan.item_code.as_str().to_string(),
                description: t_in(
                    locale,
                    "recon.recommendation.urgent_review",
                    &[
                        ("item_code", orphan.item_code.as_str()),
                        ("count", &orphan.batch_count.to_string()),
                    ],
                ),
                affected_batches: orphan.batch_count,
            });
        }

        if overall_stats.formulas_with_no_batches > self.config.formula_cleanup_min_formulas {
            recommendations.push(Recommendation {
                priority: RecommendationPriority::Low,
                recommendation_type: RecommendationType::FormulaCleanup,
                target: String::new(),
                description: t_in(
                    locale,
                    "recon.recommendation.formula_cleanup",
                    &[("count", &overall_stats.formulas_with_no_batches.to_string())],
                ),
                affected_batches: 0,
            });
        }

        debug!(count = recommendations.len(), "整改建议生成完成");
        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliance_score_bounds() {
        assert_eq!(compliance_score(0, 0, 0), 100);
        assert_eq!(compliance_score(2, 0, 2), 100);
        assert_eq!(compliance_score(0, 0, 3), 0);
        assert_eq!(compliance_score(1, 1, 2), 75);
        // 1/3 -> 33
        assert_eq!(compliance_score(1, 0, 3), 33);
        // 0.5/1 -> 50
        assert_eq!(compliance_score(0, 1, 1), 50);
    }

    #[test]
    fn test_rounding_half_up() {
        // 2.5/4 = 62.5 -> 63
        assert_eq!(compliance_score(2, 1, 4), 63);
        assert_eq!(rounded_percentage(1.0, 8), 13);
    }

    #[test]
    fn test_empty_input() {
        let config = ReconciliationConfig::default();
        let summary = ReportAggregator::new(&config).aggregate(&[], &[], 0);
        assert_eq!(summary.overall_stats.compliance_score, 100);
        assert_eq!(summary.batch_reconciliation.reconciliation_percentage, 100);
        assert!(summary.batch_reconciliation.all_batches_accounted_for);
        assert!(summary.recommendations.is_empty());
        assert!(summary.orphan_batches.is_empty());
    }
}
