// ==========================================
// 药品批记录对账引擎 - 批次登记 (Batch Registry)
// ==========================================
// 职责: 批次容器文档 (含父级元数据) 与扁平化后的批次行
// 说明: 嵌套批次条目的所有字段均可缺失,容忍畸形数据
// ==========================================

use crate::domain::types::{
    deserialize_lenient_id, deserialize_lenient_list, BatchStatus, BatchType, Recorded,
};
use serde::{Deserialize, Serialize};

// ==========================================
// BatchEntry - 嵌套批次条目 (原始形态)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    #[serde(default)]
    pub batch_number: Recorded<String>,
    #[serde(default)]
    pub item_code: Recorded<String>,
    #[serde(default)]
    pub item_name: Recorded<String>,
    #[serde(default)]
    pub mfg_date: Recorded<String>,
    #[serde(default)]
    pub expiry_date: Recorded<String>,
    #[serde(default)]
    pub batch_size: Recorded<String>,
    #[serde(default)]
    pub pack: Recorded<String>,
    /// 条目级许可证号 (优先于父级)
    #[serde(default)]
    pub mfg_lic_no: Recorded<String>,
    #[serde(default)]
    pub make: Recorded<String>,
    #[serde(default)]
    pub status: Recorded<String>,
}

// ==========================================
// BatchContainerRecord - 批次容器文档
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchContainerRecord {
    #[serde(default, deserialize_with = "deserialize_lenient_id")]
    pub document_id: String,
    #[serde(default)]
    pub company_name: Recorded<String>,
    #[serde(default)]
    pub department: Recorded<String>,
    #[serde(default, rename = "type")]
    pub batch_type: Recorded<String>,
    #[serde(default)]
    pub unit: Recorded<String>,
    #[serde(default)]
    pub make: Recorded<String>,
    #[serde(default)]
    pub mfg_lic_no: Recorded<String>,
    #[serde(default)]
    pub location_id: Recorded<String>,
    /// 非对象条目读为全 Unknown 的条目,仍参与扁平化
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub batches: Vec<BatchEntry>,
}

// ==========================================
// BatchLineItem - 扁平化批次行
// ==========================================
// 统一字段集,缺失字段为 Unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchLineItem {
    pub batch_number: Recorded<String>,
    pub item_code: Recorded<String>,
    pub item_name: Recorded<String>,
    pub mfg_date: Recorded<String>,
    pub expiry_date: Recorded<String>,
    pub batch_size: Recorded<String>,
    pub department: Recorded<String>,
    #[serde(rename = "type")]
    pub batch_type: BatchType,
    pub unit: Recorded<String>,
    pub make: Recorded<String>,
    pub mfg_lic_no: Recorded<String>,
    pub location_id: Recorded<String>,
    pub pack: Recorded<String>,
    pub status: BatchStatus,
    /// 来源文档
    pub source_document_id: String,
}

impl BatchLineItem {
    /// 批号与品目编码均未知 (无法识别的批次)
    pub fn is_unidentifiable(&self) -> bool {
        self.item_code.is_unknown() && self.batch_number.is_unknown()
    }
}
