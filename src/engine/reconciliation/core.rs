// ==========================================
// 药品批记录对账引擎 - 对账主引擎
// ==========================================
// 输入: 处方集合 + 批次容器文档集合
// 输出: 对账报告
// ==========================================
// 注: 每次调用独立,输入为不可变快照时可并发调用
// ==========================================

use crate::config::ReconciliationConfig;
use crate::domain::batch::BatchContainerRecord;
use crate::domain::formula::FormulaRecord;
use crate::domain::reconciliation::FormulaReconciliationResult;
use crate::domain::report::{
    AuxiliaryDocumentCounts, DataSources, ReconciliationReport, RuleCoverage,
};
use crate::engine::batch_flattener::flatten_batches;
use crate::engine::batch_matcher::partition_batches;
use crate::engine::formula_index::FormulaIndex;
use crate::engine::formula_validator::FormulaValidator;
use crate::engine::report_aggregator::ReportAggregator;
use crate::engine::report_assembler::assemble_report;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

// ==========================================
// ReconciliationEngine - 对账主引擎
// ==========================================
// 无状态: 仅持有参数与规则集
pub struct ReconciliationEngine {
    config: ReconciliationConfig,
    validator: FormulaValidator,
}

impl ReconciliationEngine {
    /// 创建对账引擎
    pub fn new(config: ReconciliationConfig) -> Self {
        let validator = FormulaValidator::new(&config.report_locale);
        Self { config, validator }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// 生成对账报告 (当前时间)
    pub fn reconcile(
        &self,
        formulas: &[FormulaRecord],
        batch_documents: &[BatchContainerRecord],
    ) -> ReconciliationReport {
        self.reconcile_at(
            formulas,
            batch_documents,
            AuxiliaryDocumentCounts::default(),
            Utc::now(),
        )
    }

    /// 生成对账报告 (指定生成时间)
    ///
    /// # 参数
    /// - `formulas`: 处方集合 (顺序决定次级编码归属)
    /// - `batch_documents`: 批次容器文档集合
    /// - `auxiliary`: 检验报告/领料单计数 (仅用于数据来源统计)
    /// - `generated_at`: 报告时间戳
    pub fn reconcile_at(
        &self,
        formulas: &[FormulaRecord],
        batch_documents: &[BatchContainerRecord],
        auxiliary: AuxiliaryDocumentCounts,
        generated_at: DateTime<Utc>,
    ) -> ReconciliationReport {
        info!(
            formulas = formulas.len(),
            batch_documents = batch_documents.len(),
            "开始批次对账"
        );

        // 1. 处方索引 + 批次扁平化
        let index = FormulaIndex::build(formulas);
        if !index.main_code_collisions().is_empty() {
            warn!(
                collisions = index.main_code_collisions().len(),
                "处方主产品编码存在重复,已按后写覆盖处理"
            );
        }
        let items = flatten_batches(batch_documents);
        let total_batch_items = items.len();

        // 2. 批次匹配
        let partition = partition_batches(items, &index);

        // 3. 处方级校验 (含无批次处方)
        let mut formula_results: Vec<FormulaReconciliationResult> = formulas
            .iter()
            .enumerate()
            .map(|(position, formula)| {
                self.validator
                    .validate_formula(formula, partition.batches_for(position))
            })
            .collect();

        // 批次总数降序,同数保持输入顺序
        formula_results.sort_by(|a, b| b.stats.total_batches.cmp(&a.stats.total_batches));

        // 4. 汇总
        let aggregate = ReportAggregator::new(&self.config).aggregate(
            &formula_results,
            partition.orphan_groups(),
            total_batch_items,
        );

        if !aggregate.batch_reconciliation.all_batches_accounted_for {
            warn!(
                total_batches = total_batch_items,
                matched = aggregate.batch_reconciliation.batches_matched_to_formula,
                orphans = aggregate.batch_reconciliation.batches_not_matched_to_formula,
                "批次核算不平"
            );
        }

        // 5. 组装
        let data_sources = DataSources {
            formula_records: formulas.len(),
            batch_documents: batch_documents.len(),
            batch_line_items: total_batch_items,
            coa_documents: auxiliary.coa_documents,
            material_requisitions: auxiliary.material_requisitions,
        };

        let rule_coverage: Vec<RuleCoverage> = self
            .validator
            .rules()
            .iter()
            .map(|rule| RuleCoverage {
                rule: rule.mismatch_type(),
                evaluated: rule.evaluated(),
            })
            .collect();

        let report = assemble_report(
            generated_at,
            data_sources,
            formula_results,
            aggregate,
            rule_coverage,
        );

        debug!(report_id = %report.report_id, "对账报告组装完成");
        info!(
            report_id = %report.report_id,
            compliance_score = report.overall_stats.compliance_score,
            reconciliation_percentage = report.batch_reconciliation.reconciliation_percentage,
            orphan_codes = report.orphan_batches.len(),
            "批次对账完成"
        );

        report
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new(ReconciliationConfig::default())
    }
}
