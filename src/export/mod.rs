// ==========================================
// 药品批记录对账引擎 - 报告导出层
// ==========================================
// 职责: 报告落盘 (JSON 全量 / CSV 审计表)
// ==========================================

pub mod csv;
pub mod error;
pub mod json;

pub use self::csv::{export_csv_tables, FORMULA_SUMMARY_FILE, ORPHAN_BATCHES_FILE};
pub use self::error::{ExportError, ExportResult};
pub use self::json::{export_report_json, write_report_json};
