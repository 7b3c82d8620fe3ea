// ==========================================
// 药品批记录对账引擎 - 对账主引擎
// ==========================================
// 输入: 处方集合 + 批次容器文档集合 (调用前已全部加载)
// 输出: ReconciliationReport
// ==========================================
// 流程: 索引构建 / 批次扁平化 -> 匹配 -> 处方校验 -> 汇总 -> 组装
// 红线: 单次同步纯计算,无持久状态,无重试
// ==========================================

mod core;

#[cfg(test)]
mod tests;

pub use self::core::ReconciliationEngine;
