// ==========================================
// 药品批记录对账引擎 - 批次扁平化
// ==========================================
// 输入: 批次容器文档集合
// 输出: 扁平批次行 (文档顺序 -> 嵌套顺序)
// ==========================================
// 红线: 全函数,不丢条目,不因畸形条目报错
// ==========================================

use crate::domain::batch::{BatchContainerRecord, BatchEntry, BatchLineItem};
use crate::domain::types::{BatchStatus, BatchType};
use tracing::{debug, warn};

/// 扁平化全部文档
pub fn flatten_batches(documents: &[BatchContainerRecord]) -> Vec<BatchLineItem> {
    let mut items = Vec::with_capacity(documents.iter().map(|doc| doc.batches.len()).sum());
    let mut unidentifiable = 0usize;

    for document in documents {
        for entry in &document.batches {
            let item = flatten_entry(document, entry);
            if item.is_unidentifiable() {
                unidentifiable += 1;
                warn!(
                    document_id = %document.document_id,
                    "批次条目缺少批号与品目编码,按未知品目计入孤儿批次"
                );
            }
            items.push(item);
        }
    }

    debug!(
        documents = documents.len(),
        line_items = items.len(),
        unidentifiable = unidentifiable,
        "批次扁平化完成"
    );

    items
}

/// 单条目扁平化: 条目字段优先,父级元数据兜底
fn flatten_entry(document: &BatchContainerRecord, entry: &BatchEntry) -> BatchLineItem {
    BatchLineItem {
        batch_number: entry.batch_number.clone(),
        item_code: entry.item_code.clone(),
        item_name: entry.item_name.clone(),
        mfg_date: entry.mfg_date.clone(),
        expiry_date: entry.expiry_date.clone(),
        batch_size: entry.batch_size.clone(),
        department: document.department.clone(),
        batch_type: BatchType::parse(&document.batch_type),
        unit: document.unit.clone(),
        make: entry.make.clone().or(document.make.clone()),
        mfg_lic_no: entry.mfg_lic_no.clone().or(document.mfg_lic_no.clone()),
        location_id: document.location_id.clone(),
        pack: entry.pack.clone(),
        status: BatchStatus::parse(&entry.status),
        source_document_id: document.document_id.clone(),
    }
}
