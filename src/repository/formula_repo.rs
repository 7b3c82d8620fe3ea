// ==========================================
// 药品批记录对账引擎 - 处方主数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 读取顺序 = 写入顺序 (seq / stage_seq),次级编码归属依赖此顺序
// ==========================================

use crate::domain::formula::{FillingStage, FormulaRecord, ProcessStage};
use crate::domain::types::Recorded;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Transaction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// FormulaRepository - 处方仓储
// ==========================================
/// 处方仓储
/// 职责: 管理 formula_master / formula_filling_stage / formula_process_stage 表
pub struct FormulaRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FormulaRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量插入处方 (事务化)
    ///
    /// # 返回
    /// - Ok(usize): 插入的处方数
    /// - Err: 数据库错误（整个事务回滚）
    pub fn insert_batch(&self, formulas: &[FormulaRecord]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        for formula in formulas {
            Self::insert_tx(&tx, formula)?;
        }
        tx.commit()?;
        Ok(formulas.len())
    }

    fn insert_tx(tx: &Transaction, formula: &FormulaRecord) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO formula_master (
                formula_id, master_card_no, main_product_code, product_name,
                generic_name, manufacturer, revision_no, manufacturing_license_no
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                formula.formula_id,
                formula.master_card_no.known(),
                formula.main_product_code.known(),
                formula.product_name.known(),
                formula.generic_name.known(),
                formula.manufacturer.known(),
                formula.revision_no.known(),
                formula.manufacturing_license_no.known(),
            ],
        )?;

        for (seq, stage) in formula.filling_stages.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO formula_filling_stage (
                    formula_id, stage_seq, product_code, product_name, pack_size
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    formula.formula_id,
                    seq as i64,
                    stage.product_code.known(),
                    stage.product_name.known(),
                    stage.pack_size.known(),
                ],
            )?;
        }

        for (seq, stage) in formula.process_stages.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO formula_process_stage (
                    formula_id, stage_seq, stage_name, filling_product_code
                ) VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    formula.formula_id,
                    seq as i64,
                    stage.stage_name.known(),
                    stage.filling_product_code.known(),
                ],
            )?;
        }

        Ok(())
    }

    /// 查询全部处方 (按写入顺序)
    pub fn list_all(&self) -> RepositoryResult<Vec<FormulaRecord>> {
        let conn = self.get_conn()?;

        let mut filling: HashMap<String, Vec<FillingStage>> = HashMap::new();
        {
            let mut stmt = conn.prepare(
                r#"
                SELECT formula_id, product_code, product_name, pack_size
                FROM formula_filling_stage
                ORDER BY formula_id, stage_seq
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    FillingStage {
                        product_code: Recorded::from(row.get::<_, Option<String>>(1)?),
                        product_name: Recorded::from(row.get::<_, Option<String>>(2)?),
                        pack_size: Recorded::from(row.get::<_, Option<String>>(3)?),
                    },
                ))
            })?;
            for row in rows {
                let (formula_id, stage) = row?;
                filling.entry(formula_id).or_default().push(stage);
            }
        }

        let mut process: HashMap<String, Vec<ProcessStage>> = HashMap::new();
        {
            let mut stmt = conn.prepare(
                r#"
                SELECT formula_id, stage_name, filling_product_code
                FROM formula_process_stage
                ORDER BY formula_id, stage_seq
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    ProcessStage {
                        stage_name: Recorded::from(row.get::<_, Option<String>>(1)?),
                        filling_product_code: Recorded::from(row.get::<_, Option<String>>(2)?),
                    },
                ))
            })?;
            for row in rows {
                let (formula_id, stage) = row?;
                process.entry(formula_id).or_default().push(stage);
            }
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT
                formula_id, master_card_no, main_product_code, product_name,
                generic_name, manufacturer, revision_no, manufacturing_license_no
            FROM formula_master
            ORDER BY seq
            "#,
        )?;
        let formulas = stmt
            .query_map([], |row| {
                Ok(FormulaRecord {
                    formula_id: row.get(0)?,
                    master_card_no: Recorded::from(row.get::<_, Option<String>>(1)?),
                    main_product_code: Recorded::from(row.get::<_, Option<String>>(2)?),
                    product_name: Recorded::from(row.get::<_, Option<String>>(3)?),
                    generic_name: Recorded::from(row.get::<_, Option<String>>(4)?),
                    manufacturer: Recorded::from(row.get::<_, Option<String>>(5)?),
                    revision_no: Recorded::from(row.get::<_, Option<String>>(6)?),
                    manufacturing_license_no: Recorded::from(row.get::<_, Option<String>>(7)?),
                    filling_stages: Vec::new(),
                    process_stages: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(formulas
            .into_iter()
            .map(|mut formula| {
                formula.filling_stages = filling.remove(&formula.formula_id).unwrap_or_default();
                formula.process_stages = process.remove(&formula.formula_id).unwrap_or_default();
                formula
            })
            .collect())
    }

    /// 处方总数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM formula_master", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
