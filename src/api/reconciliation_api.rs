// ==========================================
// 药品批记录对账引擎 - 对账 API
// ==========================================
// 职责: 读取数据源快照 -> 调用对账引擎 -> 返回报告
// 架构: API 层 → Engine 层 (ReconciliationEngine) / Repository 层 (ReconciliationDataSource)
// 约束: 要么完整报告,要么错误;不重试
// ==========================================

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ReconciliationConfig;
use crate::domain::reconciliation::FormulaReconciliationResult;
use crate::domain::batch::BatchContainerRecord;
use crate::domain::formula::FormulaRecord;
use crate::domain::report::{AuxiliaryDocumentCounts, ReconciliationReport};
use crate::engine::{FormulaIndex, ReconciliationEngine};
use crate::repository::data_source::ReconciliationDataSource;

// ==========================================
// ReconciliationApi - 对账 API
// ==========================================
pub struct ReconciliationApi {
    data_source: Arc<dyn ReconciliationDataSource>,
    engine: ReconciliationEngine,
}

impl ReconciliationApi {
    /// 创建新的 ReconciliationApi 实例
    ///
    /// # 参数
    /// - data_source: 对账数据源
    /// - config: 对账参数 (创建时校验)
    pub fn new(
        data_source: Arc<dyn ReconciliationDataSource>,
        config: ReconciliationConfig,
    ) -> ApiResult<Self> {
        config.validate()?;
        Ok(Self {
            data_source,
            engine: ReconciliationEngine::new(config),
        })
    }

    pub fn config(&self) -> &ReconciliationConfig {
        self.engine.config()
    }

    /// 并发读取三类数据源,任一失败即整体失败
    async fn fetch_snapshot(
        &self,
    ) -> ApiResult<(Vec<FormulaRecord>, Vec<BatchContainerRecord>, AuxiliaryDocumentCounts)> {
        let (formulas, batch_documents, auxiliary) = futures::try_join!(
            self.data_source.list_all_formulas(),
            self.data_source.list_all_batch_documents(),
            self.data_source.count_auxiliary_documents(),
        )
        .map_err(|e| {
            error!(error = %e, "对账数据源读取失败");
            ApiError::from(e)
        })?;

        info!(
            formulas = formulas.len(),
            batch_documents = batch_documents.len(),
            "对账数据源读取完成"
        );

        Ok((formulas, batch_documents, auxiliary))
    }

    /// 生成对账报告
    ///
    /// # 返回
    /// - Ok(ReconciliationReport): 完整报告
    /// - Err(ApiError): 任一数据源读取失败
    #[instrument(skip(self))]
    pub async fn generate_report(&self) -> ApiResult<ReconciliationReport> {
        let (formulas, batch_documents, auxiliary) = self.fetch_snapshot().await?;

        Ok(self.engine.reconcile_at(
            &formulas,
            &batch_documents,
            auxiliary,
            chrono::Utc::now(),
        ))
    }

    /// 查询指定处方卡号的对账结果
    ///
    /// 处方卡号经 FormulaIndex 解析 (重复卡号以后登记的处方为准),
    /// 再按处方标识取结果
    #[instrument(skip(self))]
    pub async fn formula_result(
        &self,
        master_card_no: &str,
    ) -> ApiResult<FormulaReconciliationResult> {
        let master_card_no = master_card_no.trim();
        if master_card_no.is_empty() {
            return Err(ApiError::InvalidInput("处方卡号不能为空".to_string()));
        }

        let (formulas, batch_documents, auxiliary) = self.fetch_snapshot().await?;

        let formula_id = FormulaIndex::build(&formulas)
            .formula_by_master_card(master_card_no)
            .map(|formula| formula.formula_id.clone())
            .ok_or_else(|| ApiError::NotFound(format!("处方卡号(mfc={})不存在", master_card_no)))?;

        let report = self.engine.reconcile_at(
            &formulas,
            &batch_documents,
            auxiliary,
            chrono::Utc::now(),
        );
        report
            .formula_result_by_id(&formula_id)
            .cloned()
            .ok_or_else(|| {
                ApiError::InternalError(format!("处方(id={})缺少对账结果", formula_id))
            })
    }
}
