// ==========================================
// 药品批记录对账引擎 - JSON 报告导出
// ==========================================

use crate::domain::report::ReconciliationReport;
use crate::export::error::{ExportError, ExportResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// 写出完整报告 (pretty JSON, camelCase 键)
pub fn write_report_json<W: Write>(report: &ReconciliationReport, writer: W) -> ExportResult<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// 导出完整报告到文件
pub fn export_report_json(report: &ReconciliationReport, path: impl AsRef<Path>) -> ExportResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).map_err(|e| ExportError::FileWriteError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    write_report_json(report, file)?;

    info!(report_id = %report.report_id, path = %path.display(), "JSON 报告导出完成");
    Ok(())
}
