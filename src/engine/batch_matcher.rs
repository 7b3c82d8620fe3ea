// ==========================================
// 药品批记录对账引擎 - 批次-处方匹配
// ==========================================
// 输入: 扁平批次行 + 处方索引
// 输出: 已匹配 (按处方分组) / 孤儿 (按品目编码分组)
// ==========================================
// 分组键为处方身份而非产品编码:
// 同一处方的多个关联编码汇入同一分组
// ==========================================

use crate::domain::batch::BatchLineItem;
use crate::domain::types::Recorded;
use crate::engine::formula_index::FormulaIndex;
use std::collections::HashMap;
use tracing::debug;

/// 同一品目编码下的孤儿批次
#[derive(Debug, Clone)]
pub struct OrphanGroup {
    pub item_code: Recorded<String>,
    pub batches: Vec<BatchLineItem>,
}

// ==========================================
// BatchPartition - 匹配结果
// ==========================================
#[derive(Debug, Default)]
pub struct BatchPartition {
    /// 处方位置 -> 批次
    formula_to_batches: HashMap<usize, Vec<BatchLineItem>>,
    /// 首次出现顺序
    orphan_groups: Vec<OrphanGroup>,
    matched_count: usize,
    orphan_count: usize,
}

impl BatchPartition {
    /// 指定处方的匹配批次 (无则为空)
    pub fn batches_for(&self, formula_position: usize) -> &[BatchLineItem] {
        self.formula_to_batches
            .get(&formula_position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn orphan_groups(&self) -> &[OrphanGroup] {
        &self.orphan_groups
    }

    pub fn matched_count(&self) -> usize {
        self.matched_count
    }

    pub fn orphan_count(&self) -> usize {
        self.orphan_count
    }

    pub fn matched_formula_count(&self) -> usize {
        self.formula_to_batches.len()
    }
}

/// 划分批次
pub fn partition_batches(items: Vec<BatchLineItem>, index: &FormulaIndex<'_>) -> BatchPartition {
    let mut partition = BatchPartition::default();
    let mut orphan_slots: HashMap<Recorded<String>, usize> = HashMap::new();

    for item in items {
        let entry = item.item_code.known().and_then(|code| index.lookup(code));

        match entry {
            Some(entry) => {
                partition
                    .formula_to_batches
                    .entry(entry.position)
                    .or_default()
                    .push(item);
                partition.matched_count += 1;
            }
            None => {
                let slot = *orphan_slots.entry(item.item_code.clone()).or_insert_with(|| {
                    partition.orphan_groups.push(OrphanGroup {
                        item_code: item.item_code.clone(),
                        batches: Vec::new(),
                    });
                    partition.orphan_groups.len() - 1
                });
                partition.orphan_groups[slot].batches.push(item);
                partition.orphan_count += 1;
            }
        }
    }

    debug!(
        matched = partition.matched_count,
        orphans = partition.orphan_count,
        orphan_codes = partition.orphan_groups.len(),
        "批次匹配完成"
    );

    partition
}
