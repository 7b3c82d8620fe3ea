// ==========================================
// 药品批记录对账引擎 - CSV 审计表导出
// ==========================================
// 输出: 处方汇总表 + 孤儿批次表
// 红线: 只读报告,不修改
// ==========================================

use crate::domain::report::ReconciliationReport;
use crate::export::error::{ExportError, ExportResult};
use csv::Writer;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// 处方汇总表文件名
pub const FORMULA_SUMMARY_FILE: &str = "formula_summary.csv";

/// 孤儿批次表文件名
pub const ORPHAN_BATCHES_FILE: &str = "orphan_batches.csv";

#[derive(Debug, Serialize)]
struct FormulaSummaryRow<'a> {
    formula_id: &'a str,
    master_card_no: &'a str,
    main_product_code: &'a str,
    product_name: &'a str,
    manufacturing_license_no: &'a str,
    reconciliation_status: String,
    total_batches: usize,
    batches_in_use: usize,
    cancelled_batches: usize,
    rejected_batches: usize,
    reconciled_batches: usize,
    mismatched_batches: usize,
    mfc_mismatches: usize,
    revision_mismatches: usize,
    material_mismatches: usize,
    obsolete_formula_used: usize,
}

#[derive(Debug, Serialize)]
struct OrphanRow<'a> {
    item_code: &'a str,
    item_name: &'a str,
    batch_count: usize,
    compliance_risk: String,
    reason: &'a str,
}

/// 写出处方汇总表 (顺序与报告一致)
pub fn write_formula_summary<W: Write>(report: &ReconciliationReport, writer: W) -> ExportResult<usize> {
    let mut wtr = Writer::from_writer(writer);
    for result in &report.formula_results {
        wtr.serialize(FormulaSummaryRow {
            formula_id: &result.formula_id,
            master_card_no: result.master_card_no.as_str(),
            main_product_code: result.main_product_code.as_str(),
            product_name: result.product_name.as_str(),
            manufacturing_license_no: result.manufacturing_license_no.as_str(),
            reconciliation_status: result.reconciliation_status.to_string(),
            total_batches: result.stats.total_batches,
            batches_in_use: result.stats.batches_in_use,
            cancelled_batches: result.stats.cancelled_batches,
            rejected_batches: result.stats.rejected_batches,
            reconciled_batches: result.stats.reconciled_batches,
            mismatched_batches: result.stats.mismatched_batches,
            mfc_mismatches: result.mismatch_summary.mfc_mismatches,
            revision_mismatches: result.mismatch_summary.revision_mismatches,
            material_mismatches: result.mismatch_summary.material_mismatches,
            obsolete_formula_used: result.mismatch_summary.obsolete_formula_used,
        })?;
    }
    wtr.flush()?;
    Ok(report.formula_results.len())
}

/// 写出孤儿批次表 (按批次数降序,与报告一致)
pub fn write_orphan_batches<W: Write>(report: &ReconciliationReport, writer: W) -> ExportResult<usize> {
    let mut wtr = Writer::from_writer(writer);
    if report.orphan_batches.is_empty() {
        // 无数据行时仍输出表头
        wtr.write_record(["item_code", "item_name", "batch_count", "compliance_risk", "reason"])?;
    }
    for orphan in &report.orphan_batches {
        wtr.serialize(OrphanRow {
            item_code: orphan.item_code.as_str(),
            item_name: orphan.item_name.as_str(),
            batch_count: orphan.batch_count,
            compliance_risk: orphan.compliance_risk.to_string(),
            reason: &orphan.reason,
        })?;
    }
    wtr.flush()?;
    Ok(report.orphan_batches.len())
}

/// 导出两张审计表到目录
///
/// # 返回
/// - 写出的文件路径 (处方汇总表, 孤儿批次表)
pub fn export_csv_tables(
    report: &ReconciliationReport,
    dir: impl AsRef<Path>,
) -> ExportResult<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| ExportError::FileWriteError {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;

    let summary_path = dir.join(FORMULA_SUMMARY_FILE);
    let orphan_path = dir.join(ORPHAN_BATCHES_FILE);

    let formulas = write_formula_summary(report, create_file(&summary_path)?)?;
    let orphans = write_orphan_batches(report, create_file(&orphan_path)?)?;

    info!(
        report_id = %report.report_id,
        formulas,
        orphans,
        dir = %dir.display(),
        "CSV 审计表导出完成"
    );

    Ok((summary_path, orphan_path))
}

fn create_file(path: &Path) -> ExportResult<File> {
    File::create(path).map_err(|e| ExportError::FileWriteError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
