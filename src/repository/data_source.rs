// ==========================================
// 药品批记录对账引擎 - 对账数据源 Trait
// ==========================================
// 职责: 一次性提供对账所需的完整快照
// 红线: 数据源只读,不含对账规则
// ==========================================

use crate::domain::batch::BatchContainerRecord;
use crate::domain::formula::FormulaRecord;
use crate::domain::report::AuxiliaryDocumentCounts;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ReconciliationDataSource Trait
// ==========================================
// 实现者: InMemoryDataSource (内存 / JSON 快照), SqliteDataSource (rusqlite)
#[async_trait]
pub trait ReconciliationDataSource: Send + Sync {
    /// 全部处方记录 (保持存储顺序,顺序决定次级编码归属)
    async fn list_all_formulas(&self) -> RepositoryResult<Vec<FormulaRecord>>;

    /// 全部批次容器文档 (保持存储顺序)
    async fn list_all_batch_documents(&self) -> RepositoryResult<Vec<BatchContainerRecord>>;

    /// 检验报告 / 领料单计数
    async fn count_auxiliary_documents(&self) -> RepositoryResult<AuxiliaryDocumentCounts>;
}
