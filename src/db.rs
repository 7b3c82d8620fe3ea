// ==========================================
// 药品批记录对账引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，外键约束在每个连接上开启
// - 统一 busy_timeout，减少并发读写时的偶发 busy 错误
// - 统一建表 (处方主数据 / 批次登记 / 辅助文档 / 配置表)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;
use tracing::{info, warn};

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "PHARMA_BATCH_RECON_DB_PATH";

/// 获取默认数据库路径
///
/// 优先级: 环境变量 PHARMA_BATCH_RECON_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./pharma_batch_recon.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("pharma-batch-recon");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("pharma_batch_recon.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// # 表
/// - formula_master / formula_filling_stage / formula_process_stage: 处方主数据
/// - batch_document / batch_entry: 批次登记 (容器文档 + 嵌套条目)
/// - coa_document / material_requisition: 辅助文档 (仅计数)
/// - config_scope / config_kv: 对账参数覆写
///
/// 说明: 可缺失字段一律允许 NULL,NULL 即“未记录”
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS formula_master (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            formula_id TEXT NOT NULL UNIQUE,
            master_card_no TEXT,
            main_product_code TEXT,
            product_name TEXT,
            generic_name TEXT,
            manufacturer TEXT,
            revision_no TEXT,
            manufacturing_license_no TEXT
        );

        CREATE TABLE IF NOT EXISTS formula_filling_stage (
            formula_id TEXT NOT NULL REFERENCES formula_master(formula_id) ON DELETE CASCADE,
            stage_seq INTEGER NOT NULL,
            product_code TEXT,
            product_name TEXT,
            pack_size TEXT,
            PRIMARY KEY (formula_id, stage_seq)
        );

        CREATE TABLE IF NOT EXISTS formula_process_stage (
            formula_id TEXT NOT NULL REFERENCES formula_master(formula_id) ON DELETE CASCADE,
            stage_seq INTEGER NOT NULL,
            stage_name TEXT,
            filling_product_code TEXT,
            PRIMARY KEY (formula_id, stage_seq)
        );

        CREATE TABLE IF NOT EXISTS batch_document (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id TEXT NOT NULL UNIQUE,
            company_name TEXT,
            department TEXT,
            batch_type TEXT,
            unit TEXT,
            make TEXT,
            mfg_lic_no TEXT,
            location_id TEXT
        );

        CREATE TABLE IF NOT EXISTS batch_entry (
            document_id TEXT NOT NULL REFERENCES batch_document(document_id) ON DELETE CASCADE,
            entry_seq INTEGER NOT NULL,
            batch_number TEXT,
            item_code TEXT,
            item_name TEXT,
            mfg_date TEXT,
            expiry_date TEXT,
            batch_size TEXT,
            pack TEXT,
            mfg_lic_no TEXT,
            make TEXT,
            status TEXT,
            PRIMARY KEY (document_id, entry_seq)
        );

        CREATE INDEX IF NOT EXISTS idx_batch_entry_item_code ON batch_entry(item_code);

        CREATE TABLE IF NOT EXISTS coa_document (
            document_id TEXT PRIMARY KEY,
            batch_number TEXT,
            item_code TEXT,
            payload TEXT
        );

        CREATE TABLE IF NOT EXISTS material_requisition (
            document_id TEXT PRIMARY KEY,
            batch_number TEXT,
            payload TEXT
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    info!(schema_version = CURRENT_SCHEMA_VERSION, "数据库 schema 初始化完成");
    Ok(())
}

/// 校验 schema 版本,不一致时仅告警
pub fn check_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let version = read_schema_version(conn)?;
    match version {
        Some(v) if v == CURRENT_SCHEMA_VERSION => {}
        Some(v) => warn!(
            found = v,
            expected = CURRENT_SCHEMA_VERSION,
            "数据库 schema 版本与当前程序不一致"
        ),
        None => warn!("数据库缺少 schema_version 表,可能未初始化"),
    }
    Ok(version)
}
