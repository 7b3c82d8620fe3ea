// ==========================================
// 药品批记录对账引擎 - 领域模型层
// ==========================================
// 职责: 定义处方、批次、对账结果与报告实体
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod batch;
pub mod formula;
pub mod reconciliation;
pub mod report;
pub mod types;

// 重导出核心类型
pub use batch::{BatchContainerRecord, BatchEntry, BatchLineItem};
pub use formula::{FillingStage, FormulaRecord, ProcessStage};
pub use reconciliation::{
    BatchValidationResult, FormulaReconciliationResult, FormulaStats, Mismatch, MismatchSummary,
    OrphanBatchEntry, OrphanBatchResult,
};
pub use report::{
    AuxiliaryDocumentCounts, BatchReconciliationSummary, DataSources, OverallStats,
    Recommendation, ReconciliationReport, RuleCoverage,
};
pub use types::{
    BatchStatus, BatchType, ComplianceRisk, MismatchType, RecommendationPriority,
    RecommendationType, ReconciliationStatus, Recorded, RevisionMatch, Severity, UNKNOWN_MARKER,
};
