// ==========================================
// 药品批记录对账引擎 - 批次登记仓储
// ==========================================
// 红线: Repository 不含业务逻辑 (父级回退由引擎扁平化完成)
// 说明: 读取顺序 = 写入顺序 (seq / entry_seq)
// ==========================================

use crate::domain::batch::{BatchContainerRecord, BatchEntry};
use crate::domain::report::AuxiliaryDocumentCounts;
use crate::domain::types::Recorded;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Transaction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// BatchDocumentRepository - 批次容器文档仓储
// ==========================================
/// 批次容器文档仓储
/// 职责: 管理 batch_document / batch_entry 表,以及辅助文档计数
pub struct BatchDocumentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BatchDocumentRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量插入批次容器文档 (事务化)
    pub fn insert_batch(&self, documents: &[BatchContainerRecord]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        for document in documents {
            Self::insert_tx(&tx, document)?;
        }
        tx.commit()?;
        Ok(documents.len())
    }

    fn insert_tx(tx: &Transaction, document: &BatchContainerRecord) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO batch_document (
                document_id, company_name, department, batch_type,
                unit, make, mfg_lic_no, location_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                document.document_id,
                document.company_name.known(),
                document.department.known(),
                document.batch_type.known(),
                document.unit.known(),
                document.make.known(),
                document.mfg_lic_no.known(),
                document.location_id.known(),
            ],
        )?;

        let mut stmt = tx.prepare(
            r#"
            INSERT INTO batch_entry (
                document_id, entry_seq, batch_number, item_code, item_name,
                mfg_date, expiry_date, batch_size, pack, mfg_lic_no, make, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )?;
        for (seq, entry) in document.batches.iter().enumerate() {
            stmt.execute(params![
                document.document_id,
                seq as i64,
                entry.batch_number.known(),
                entry.item_code.known(),
                entry.item_name.known(),
                entry.mfg_date.known(),
                entry.expiry_date.known(),
                entry.batch_size.known(),
                entry.pack.known(),
                entry.mfg_lic_no.known(),
                entry.make.known(),
                entry.status.known(),
            ])?;
        }
        Ok(())
    }

    /// 查询全部批次容器文档 (按写入顺序,条目按 entry_seq)
    pub fn list_all(&self) -> RepositoryResult<Vec<BatchContainerRecord>> {
        let conn = self.get_conn()?;

        let mut entries: HashMap<String, Vec<BatchEntry>> = HashMap::new();
        {
            let mut stmt = conn.prepare(
                r#"
                SELECT
                    document_id, batch_number, item_code, item_name,
                    mfg_date, expiry_date, batch_size, pack, mfg_lic_no, make, status
                FROM batch_entry
                ORDER BY document_id, entry_seq
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    BatchEntry {
                        batch_number: Recorded::from(row.get::<_, Option<String>>(1)?),
                        item_code: Recorded::from(row.get::<_, Option<String>>(2)?),
                        item_name: Recorded::from(row.get::<_, Option<String>>(3)?),
                        mfg_date: Recorded::from(row.get::<_, Option<String>>(4)?),
                        expiry_date: Recorded::from(row.get::<_, Option<String>>(5)?),
                        batch_size: Recorded::from(row.get::<_, Option<String>>(6)?),
                        pack: Recorded::from(row.get::<_, Option<String>>(7)?),
                        mfg_lic_no: Recorded::from(row.get::<_, Option<String>>(8)?),
                        make: Recorded::from(row.get::<_, Option<String>>(9)?),
                        status: Recorded::from(row.get::<_, Option<String>>(10)?),
                    },
                ))
            })?;
            for row in rows {
                let (document_id, entry) = row?;
                entries.entry(document_id).or_default().push(entry);
            }
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT
                document_id, company_name, department, batch_type,
                unit, make, mfg_lic_no, location_id
            FROM batch_document
            ORDER BY seq
            "#,
        )?;
        let documents = stmt
            .query_map([], |row| {
                Ok(BatchContainerRecord {
                    document_id: row.get(0)?,
                    company_name: Recorded::from(row.get::<_, Option<String>>(1)?),
                    department: Recorded::from(row.get::<_, Option<String>>(2)?),
                    batch_type: Recorded::from(row.get::<_, Option<String>>(3)?),
                    unit: Recorded::from(row.get::<_, Option<String>>(4)?),
                    make: Recorded::from(row.get::<_, Option<String>>(5)?),
                    mfg_lic_no: Recorded::from(row.get::<_, Option<String>>(6)?),
                    location_id: Recorded::from(row.get::<_, Option<String>>(7)?),
                    batches: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents
            .into_iter()
            .map(|mut document| {
                document.batches = entries.remove(&document.document_id).unwrap_or_default();
                document
            })
            .collect())
    }

    /// 登记检验报告 (COA)
    pub fn insert_coa_document(
        &self,
        document_id: &str,
        batch_number: Option<&str>,
        item_code: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO coa_document (document_id, batch_number, item_code) VALUES (?1, ?2, ?3)",
            params![document_id, batch_number, item_code],
        )?;
        Ok(())
    }

    /// 登记领料单
    pub fn insert_material_requisition(
        &self,
        document_id: &str,
        batch_number: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO material_requisition (document_id, batch_number) VALUES (?1, ?2)",
            params![document_id, batch_number],
        )?;
        Ok(())
    }

    /// 辅助文档计数 (检验报告 / 领料单)
    pub fn count_auxiliary(&self) -> RepositoryResult<AuxiliaryDocumentCounts> {
        let conn = self.get_conn()?;
        let coa: i64 = conn.query_row("SELECT COUNT(*) FROM coa_document", [], |row| row.get(0))?;
        let requisitions: i64 =
            conn.query_row("SELECT COUNT(*) FROM material_requisition", [], |row| row.get(0))?;
        Ok(AuxiliaryDocumentCounts {
            coa_documents: coa as usize,
            material_requisitions: requisitions as usize,
        })
    }
}
