// ==========================================
// 药品批记录对账引擎 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表加载对账参数覆写
// 存储: config_kv 表 (key-value + scope), 键前缀 reconciliation/
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::reconciliation_config::ReconciliationConfig;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const UPSERT_GLOBAL_SQL: &str = r#"
    INSERT INTO config_kv (scope_id, key, value, updated_at)
    VALUES ('global', ?1, ?2, datetime('now'))
    ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
"#;

/// 配置键 (scope_id = 'global')
pub mod config_keys {
    pub const ORPHAN_HIGH_RISK_THRESHOLD: &str = "reconciliation/orphan_high_risk_threshold";
    pub const MFC_CORRECTION_MIN_BATCHES: &str = "reconciliation/mfc_correction_min_batches";
    pub const URGENT_REVIEW_MIN_BATCHES: &str = "reconciliation/urgent_review_min_batches";
    pub const URGENT_REVIEW_TOP_N: &str = "reconciliation/urgent_review_top_n";
    pub const FORMULA_CLEANUP_MIN_FORMULAS: &str = "reconciliation/formula_cleanup_min_formulas";
    pub const REPORT_LOCALE: &str = "reconciliation/report_locale";

    pub const PREFIX: &str = "reconciliation/";

    pub const ALL: [&str; 6] = [
        ORPHAN_HIGH_RISK_THRESHOLD,
        MFC_CORRECTION_MIN_BATCHES,
        URGENT_REVIEW_MIN_BATCHES,
        URGENT_REVIEW_TOP_N,
        FORMULA_CLEANUP_MIN_FORMULAS,
        REPORT_LOCALE,
    ];

    /// 解析键名为完整键 (前缀可省略); 未登记的键返回 None
    pub fn resolve(key: &str) -> Option<&'static str> {
        let key = key.trim();
        ALL.iter()
            .copied()
            .find(|full| *full == key || full.strip_prefix(PREFIX) == Some(key))
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ConfigError::ReadError {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// 读取已存储的全部对账参数覆写 (原始文本)
    fn read_stored_values(&self) -> ConfigResult<Vec<(&'static str, String)>> {
        let mut values = Vec::new();
        for key in config_keys::ALL {
            if let Some(value) = self.get_config_value(key)? {
                values.push((key, value));
            }
        }
        Ok(values)
    }

    /// 写入单个 global scope 配置 (校验通过后 upsert)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        self.set_global_config_values(&[(key, value)]).map(|_| ())
    }

    /// 批量写入 global scope 配置
    ///
    /// 先把覆写叠加到已存储值上构造候选配置并校验,
    /// 全部通过后在同一事务内 upsert; 任一失败则不写入
    ///
    /// # 返回
    /// - 写入后生效的配置
    pub fn set_global_config_values(
        &self,
        assignments: &[(&str, &str)],
    ) -> ConfigResult<ReconciliationConfig> {
        let mut resolved: Vec<(&'static str, String)> = Vec::with_capacity(assignments.len());
        for (key, value) in assignments {
            let full_key = config_keys::resolve(key)
                .ok_or_else(|| ConfigError::UnknownKey(key.trim().to_string()))?;
            resolved.push((full_key, value.trim().to_string()));
        }

        let mut values = self.read_stored_values()?;
        for (key, value) in &resolved {
            values.retain(|(stored_key, _)| stored_key != key);
            values.push((*key, value.clone()));
        }
        let candidate = build_config(&values)?;
        candidate.validate()?;

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;
        let tx = conn.transaction()?;
        for (key, value) in &resolved {
            tx.execute(UPSERT_GLOBAL_SQL, params![key, value])?;
            debug!(key = %key, value = %value, "配置已写入");
        }
        tx.commit()?;

        info!(count = resolved.len(), "对账参数覆写已保存");
        Ok(candidate)
    }

    /// 加载生效的对账参数 (默认值 + 覆写),并校验
    pub fn load_reconciliation_config(&self) -> ConfigResult<ReconciliationConfig> {
        let config = build_config(&self.read_stored_values()?)?;
        config.validate()?;

        info!(
            orphan_high_risk_threshold = config.orphan_high_risk_threshold,
            mfc_correction_min_batches = config.mfc_correction_min_batches,
            report_locale = %config.report_locale,
            "对账参数加载完成"
        );

        Ok(config)
    }

    /// 获取生效配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 随报告归档,便于审计追溯所用阈值
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let config = self.load_reconciliation_config()?;
        Ok(serde_json::to_string(&config)?)
    }
}

/// 在默认值上依次应用覆写 (不做跨字段校验)
fn build_config(values: &[(&str, String)]) -> ConfigResult<ReconciliationConfig> {
    let mut config = ReconciliationConfig::default();
    for (key, raw) in values {
        apply_value(&mut config, key, raw)?;
    }
    Ok(config)
}

fn apply_value(config: &mut ReconciliationConfig, key: &str, raw: &str) -> ConfigResult<()> {
    match key {
        config_keys::ORPHAN_HIGH_RISK_THRESHOLD => {
            config.orphan_high_risk_threshold = parse_usize(key, raw)?
        }
        config_keys::MFC_CORRECTION_MIN_BATCHES => {
            config.mfc_correction_min_batches = parse_usize(key, raw)?
        }
        config_keys::URGENT_REVIEW_MIN_BATCHES => {
            config.urgent_review_min_batches = parse_usize(key, raw)?
        }
        config_keys::URGENT_REVIEW_TOP_N => config.urgent_review_top_n = parse_usize(key, raw)?,
        config_keys::FORMULA_CLEANUP_MIN_FORMULAS => {
            config.formula_cleanup_min_formulas = parse_usize(key, raw)?
        }
        config_keys::REPORT_LOCALE => config.report_locale = raw.trim().to_string(),
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    }
    Ok(())
}

fn parse_usize(key: &str, raw: &str) -> ConfigResult<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            message: e.to_string(),
        })
}
