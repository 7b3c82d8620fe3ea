// ==========================================
// 药品批记录对账引擎 - 报告组装
// ==========================================
// 纯组合: 盖时间戳,派生报告编号,嵌套各阶段结果
// ==========================================

use crate::domain::reconciliation::FormulaReconciliationResult;
use crate::domain::report::{DataSources, ReconciliationReport, RuleCoverage};
use crate::engine::report_aggregator::AggregateSummary;
use chrono::{DateTime, Utc};

pub fn assemble_report(
    generated_at: DateTime<Utc>,
    data_sources: DataSources,
    formula_results: Vec<FormulaReconciliationResult>,
    aggregate: AggregateSummary,
    rule_coverage: Vec<RuleCoverage>,
) -> ReconciliationReport {
    ReconciliationReport {
        generated_at,
        report_id: ReconciliationReport::report_id_for(generated_at),
        data_sources,
        batch_reconciliation: aggregate.batch_reconciliation,
        formula_results,
        orphan_batches: aggregate.orphan_batches,
        overall_stats: aggregate.overall_stats,
        recommendations: aggregate.recommendations,
        rule_coverage,
    }
}
