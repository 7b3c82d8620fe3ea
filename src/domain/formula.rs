// ==========================================
// 药品批记录对账引擎 - 处方主数据 (Formula Master)
// ==========================================
// 职责: 处方记录及其灌装/工艺子记录
// 红线: 本引擎只读,由导入子系统创建/更新
// ==========================================

use crate::domain::types::{deserialize_lenient_id, deserialize_lenient_list, Recorded};
use serde::{Deserialize, Serialize};

// ==========================================
// FillingStage - 灌装阶段子记录
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillingStage {
    #[serde(default)]
    pub product_code: Recorded<String>,
    #[serde(default)]
    pub product_name: Recorded<String>,
    #[serde(default)]
    pub pack_size: Recorded<String>,
}

// ==========================================
// ProcessStage - 工艺阶段子记录
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStage {
    #[serde(default)]
    pub stage_name: Recorded<String>,
    #[serde(default)]
    pub filling_product_code: Recorded<String>,
}

// ==========================================
// FormulaRecord - 处方主数据
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaRecord {
    /// 不透明标识 (存储层主键); 缺失时由导入方按位置补占位标识
    #[serde(default, deserialize_with = "deserialize_lenient_id")]
    pub formula_id: String,

    /// 主处方卡号 (MFC)
    #[serde(default)]
    pub master_card_no: Recorded<String>,

    /// 主产品编码
    #[serde(default)]
    pub main_product_code: Recorded<String>,

    #[serde(default)]
    pub product_name: Recorded<String>,

    #[serde(default)]
    pub generic_name: Recorded<String>,

    #[serde(default)]
    pub manufacturer: Recorded<String>,

    #[serde(default)]
    pub revision_no: Recorded<String>,

    /// 生产许可证号
    #[serde(default)]
    pub manufacturing_license_no: Recorded<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub filling_stages: Vec<FillingStage>,

    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub process_stages: Vec<ProcessStage>,
}

impl FormulaRecord {
    /// 灌装/工艺阶段引入的次级产品编码
    ///
    /// 顺序: 先灌装阶段,后工艺阶段;按首次出现去重,未知编码跳过
    pub fn filling_product_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = Vec::new();
        let stage_codes = self
            .filling_stages
            .iter()
            .map(|stage| &stage.product_code)
            .chain(
                self.process_stages
                    .iter()
                    .map(|stage| &stage.filling_product_code),
            );

        for code in stage_codes.filter_map(Recorded::known) {
            if !codes.contains(&code.as_str()) {
                codes.push(code.as_str());
            }
        }
        codes
    }

    /// 关联产品编码: 主编码在前,其后为次级编码 (去重)
    pub fn linked_product_codes(&self) -> Vec<String> {
        let mut linked: Vec<String> = Vec::new();
        if let Some(main) = self.main_product_code.known() {
            linked.push(main.clone());
        }
        for code in self.filling_product_codes() {
            if !linked.iter().any(|existing| existing == code) {
                linked.push(code.to_string());
            }
        }
        linked
    }
}
