// ==========================================
// 药品批记录对账引擎 - API 层
// ==========================================
// 职责: 组合数据源与对账引擎,对外提供报告生成接口
// ==========================================

pub mod error;
pub mod reconciliation_api;

pub use error::{ApiError, ApiResult};
pub use reconciliation_api::ReconciliationApi;
