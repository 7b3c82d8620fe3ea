// ==========================================
// 药品批记录对账引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 合规审计支持 (只读对账,不修改源数据)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 对账规则
pub mod engine;

// 配置层 - 对账参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 导出层 - CSV / JSON
pub mod export;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    BatchStatus, BatchType, ComplianceRisk, MismatchType, ReconciliationStatus, Recorded, Severity,
};

// 领域实体
pub use domain::{
    BatchContainerRecord, BatchEntry, BatchLineItem, FormulaReconciliationResult, FormulaRecord,
    OrphanBatchResult, ReconciliationReport,
};

// 引擎
pub use engine::{FormulaIndex, FormulaValidator, ReconciliationEngine};

// 配置
pub use config::{ConfigManager, ReconciliationConfig};

// 数据源
pub use repository::{InMemoryDataSource, ReconciliationDataSource, SqliteDataSource};

// API
pub use api::ReconciliationApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "药品批记录对账引擎";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
