// ==========================================
// 药品批记录对账引擎 - 内存数据源
// ==========================================
// 职责: 基于内存快照提供对账数据 (单元测试 / JSON 快照文件)
// ==========================================

use crate::domain::batch::BatchContainerRecord;
use crate::domain::formula::FormulaRecord;
use crate::domain::report::AuxiliaryDocumentCounts;
use crate::domain::types::deserialize_lenient_list;
use crate::repository::data_source::ReconciliationDataSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{info, warn};

// ==========================================
// InMemoryDataSource
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    formulas: Vec<FormulaRecord>,
    batch_documents: Vec<BatchContainerRecord>,
    auxiliary: AuxiliaryDocumentCounts,
}

impl InMemoryDataSource {
    pub fn new(formulas: Vec<FormulaRecord>, batch_documents: Vec<BatchContainerRecord>) -> Self {
        Self {
            formulas,
            batch_documents,
            auxiliary: AuxiliaryDocumentCounts::default(),
        }
    }

    /// 附带辅助文档计数
    pub fn with_auxiliary(mut self, auxiliary: AuxiliaryDocumentCounts) -> Self {
        self.auxiliary = auxiliary;
        self
    }

    /// 从 JSON 快照文件加载
    ///
    /// # 参数
    /// - `formulas_path`: 处方数组 (FormulaRecord[])
    /// - `batches_path`: 批次容器文档数组 (BatchContainerRecord[])
    pub fn from_json_files(
        formulas_path: impl AsRef<Path>,
        batches_path: impl AsRef<Path>,
    ) -> RepositoryResult<Self> {
        let mut formulas: Vec<FormulaRecord> = read_json_array(formulas_path.as_ref())?;
        let mut batch_documents: Vec<BatchContainerRecord> =
            read_json_array(batches_path.as_ref())?;

        for (position, formula) in formulas.iter_mut().enumerate() {
            fill_placeholder_id(&mut formula.formula_id, "formula", position);
        }
        for (position, document) in batch_documents.iter_mut().enumerate() {
            fill_placeholder_id(&mut document.document_id, "document", position);
        }

        info!(
            formulas = formulas.len(),
            batch_documents = batch_documents.len(),
            "JSON 快照加载完成"
        );

        Ok(Self::new(formulas, batch_documents))
    }
}

/// 读取 JSON 数组快照; 无法解析的元素读为默认记录,仅非法 JSON 报错
fn read_json_array<T: DeserializeOwned + Default>(path: &Path) -> RepositoryResult<Vec<T>> {
    let raw = std::fs::read_to_string(path).map_err(|e| RepositoryError::SnapshotReadError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    let items = deserialize_lenient_list(&mut deserializer)?;
    deserializer.end()?;
    Ok(items)
}

/// 缺失标识按位置补占位: `<kind>#<序号>` (序号从 1 开始)
fn fill_placeholder_id(id: &mut String, kind: &str, position: usize) {
    if id.trim().is_empty() {
        *id = format!("{}#{}", kind, position + 1);
        warn!(placeholder_id = %id, "快照记录缺少标识,已按位置补占位");
    }
}

#[async_trait]
impl ReconciliationDataSource for InMemoryDataSource {
    async fn list_all_formulas(&self) -> RepositoryResult<Vec<FormulaRecord>> {
        Ok(self.formulas.clone())
    }

    async fn list_all_batch_documents(&self) -> RepositoryResult<Vec<BatchContainerRecord>> {
        Ok(self.batch_documents.clone())
    }

    async fn count_auxiliary_documents(&self) -> RepositoryResult<AuxiliaryDocumentCounts> {
        Ok(self.auxiliary)
    }
}
