// ==========================================
// 药品批记录对账引擎 - 引擎层
// ==========================================
// 职责: 实现对账规则与报告汇总,不拼 SQL
// 红线: Engine 不拼 SQL, 所有差异必须输出 description
// ==========================================

pub mod batch_flattener;
pub mod batch_matcher;
pub mod formula_index;
pub mod formula_validator;
pub mod reconciliation;
pub mod report_aggregator;
pub mod report_assembler;
pub mod rules;

// 重导出核心引擎
pub use batch_flattener::flatten_batches;
pub use batch_matcher::{partition_batches, BatchPartition, OrphanGroup};
pub use formula_index::{FormulaIndex, MainCodeCollision, ProductCodeEntry};
pub use formula_validator::FormulaValidator;
pub use reconciliation::ReconciliationEngine;
pub use report_aggregator::{compliance_score, AggregateSummary, ReportAggregator};
pub use report_assembler::assemble_report;
pub use rules::{
    default_rules, run_rules, BatchRule, MaterialConsistencyRule, MfcConsistencyRule,
    ObsoleteFormulaRule, RevisionRule,
};
