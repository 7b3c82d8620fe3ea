// ==========================================
// 药品批记录对账引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod batch_repo;
pub mod data_source;
pub mod error;
pub mod formula_repo;
pub mod in_memory;
pub mod sqlite_source;

// 重导出核心仓储
pub use batch_repo::BatchDocumentRepository;
pub use data_source::ReconciliationDataSource;
pub use error::{RepositoryError, RepositoryResult};
pub use formula_repo::FormulaRepository;
pub use in_memory::InMemoryDataSource;
pub use sqlite_source::SqliteDataSource;
