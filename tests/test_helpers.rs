// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use pharma_batch_recon::db::{init_schema, open_sqlite_connection};
use pharma_batch_recon::domain::{
    BatchContainerRecord, BatchEntry, FillingStage, FormulaRecord, ProcessStage,
};
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(open_sqlite_connection(db_path)?)
}

/// 打开共享连接 (仓储/数据源使用)
pub fn open_shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_test_connection(db_path)?)))
}

/// 写入 global scope 配置
pub fn insert_test_config(conn: &Connection, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

// ==========================================
// 测试数据构建器
// ==========================================

/// 创建测试用的处方
pub fn create_test_formula(id: &str, main_code: &str, license: &str) -> FormulaRecord {
    FormulaRecord {
        formula_id: id.to_string(),
        master_card_no: format!("MFC-{}", id).as_str().into(),
        main_product_code: main_code.into(),
        product_name: format!("Product {}", main_code).as_str().into(),
        generic_name: "Paracetamol".into(),
        manufacturer: "Acme Pharma".into(),
        revision_no: "R01".into(),
        manufacturing_license_no: license.into(),
        filling_stages: Vec::new(),
        process_stages: Vec::new(),
    }
}

/// 创建带灌装/工艺阶段的处方
pub fn create_test_formula_with_stages(
    id: &str,
    main_code: &str,
    license: &str,
    filling_codes: &[&str],
    process_codes: &[&str],
) -> FormulaRecord {
    let mut formula = create_test_formula(id, main_code, license);
    formula.filling_stages = filling_codes
        .iter()
        .map(|code| FillingStage {
            product_code: (*code).into(),
            product_name: format!("Pack {}", code).as_str().into(),
            pack_size: "10x10".into(),
        })
        .collect();
    formula.process_stages = process_codes
        .iter()
        .map(|code| ProcessStage {
            stage_name: "Filling".into(),
            filling_product_code: (*code).into(),
        })
        .collect();
    formula
}

/// 创建测试用的批次条目
pub fn create_test_entry(batch_number: &str, item_code: &str, license: &str) -> BatchEntry {
    BatchEntry {
        batch_number: batch_number.into(),
        item_code: item_code.into(),
        item_name: format!("Item {}", item_code).as_str().into(),
        mfg_date: "2025-01-15".into(),
        expiry_date: "2027-01-14".into(),
        batch_size: "1000".into(),
        mfg_lic_no: license.into(),
        ..Default::default()
    }
}

/// 创建测试用的批次容器文档
pub fn create_test_document(id: &str, entries: Vec<BatchEntry>) -> BatchContainerRecord {
    BatchContainerRecord {
        document_id: id.to_string(),
        company_name: "Acme Pharma".into(),
        department: "Oral Solids".into(),
        batch_type: "Export".into(),
        unit: "Unit-1".into(),
        location_id: "LOC-1".into(),
        batches: entries,
        ..Default::default()
    }
}
