// ==========================================
// 药品批记录对账引擎 - 对账参数
// ==========================================
// 职责: 报告汇总阶段的全部阈值 + 报告语言
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::i18n::{is_supported_locale, DEFAULT_LOCALE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconciliationConfig {
    /// 孤儿批次数超过该值 -> high 风险
    pub orphan_high_risk_threshold: usize,

    /// 处方批次数超过该值且存在 MFC 差异 -> mfc_correction 建议
    pub mfc_correction_min_batches: usize,

    /// 孤儿批次数超过该值 -> urgent_review 建议
    pub urgent_review_min_batches: usize,

    /// urgent_review 建议最多覆盖的孤儿编码数
    pub urgent_review_top_n: usize,

    /// 无批次处方数超过该值 -> formula_cleanup 建议
    pub formula_cleanup_min_formulas: usize,

    /// 报告文本语言
    pub report_locale: String,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            orphan_high_risk_threshold: 5,
            mfc_correction_min_batches: 10,
            urgent_review_min_batches: 5,
            urgent_review_top_n: 5,
            formula_cleanup_min_formulas: 5,
            report_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl ReconciliationConfig {
    /// 校验配置有效性
    pub fn validate(&self) -> ConfigResult<()> {
        if self.urgent_review_top_n == 0 {
            return Err(ConfigError::InvalidValue {
                key: "urgent_review_top_n".to_string(),
                value: "0".to_string(),
                message: "必须大于 0".to_string(),
            });
        }

        if !is_supported_locale(&self.report_locale) {
            return Err(ConfigError::UnsupportedLocale(self.report_locale.clone()));
        }

        Ok(())
    }
}
