// ==========================================
// 药品批记录对账引擎 - SQLite 数据源
// ==========================================
// 职责: 组合处方仓储与批次仓储,实现对账数据源接口
// ==========================================

use crate::db::{check_schema_version, open_sqlite_connection};
use crate::domain::batch::BatchContainerRecord;
use crate::domain::formula::FormulaRecord;
use crate::domain::report::AuxiliaryDocumentCounts;
use crate::repository::batch_repo::BatchDocumentRepository;
use crate::repository::data_source::ReconciliationDataSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::formula_repo::FormulaRepository;
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct SqliteDataSource {
    formulas: FormulaRepository,
    batches: BatchDocumentRepository,
}

impl SqliteDataSource {
    /// 打开数据库文件 (schema 版本不一致仅告警)
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        check_schema_version(&conn)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建数据源
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            formulas: FormulaRepository::from_connection(conn.clone()),
            batches: BatchDocumentRepository::from_connection(conn),
        }
    }

    pub fn formula_repository(&self) -> &FormulaRepository {
        &self.formulas
    }

    pub fn batch_repository(&self) -> &BatchDocumentRepository {
        &self.batches
    }
}

#[async_trait]
impl ReconciliationDataSource for SqliteDataSource {
    async fn list_all_formulas(&self) -> RepositoryResult<Vec<FormulaRecord>> {
        let formulas = self.formulas.list_all()?;
        debug!(count = formulas.len(), "处方记录读取完成");
        Ok(formulas)
    }

    async fn list_all_batch_documents(&self) -> RepositoryResult<Vec<BatchContainerRecord>> {
        let documents = self.batches.list_all()?;
        debug!(count = documents.len(), "批次容器文档读取完成");
        Ok(documents)
    }

    async fn count_auxiliary_documents(&self) -> RepositoryResult<AuxiliaryDocumentCounts> {
        self.batches.count_auxiliary()
    }
}
