// ==========================================
// 药品批记录对账引擎 - 配置层
// ==========================================
// 职责: 对账参数定义,支持 config_kv 表覆写
// ==========================================

pub mod config_manager;
pub mod error;
pub mod reconciliation_config;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use reconciliation_config::ReconciliationConfig;
