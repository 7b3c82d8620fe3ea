// ==========================================
// 药品批记录对账引擎 - 批次校验规则
// ==========================================
// 每条规则为纯函数: (批次, 处方) -> Option<差异>
// 规则按固定顺序执行,结果收集后统一构造校验结果
// ==========================================
// 当前数据结构不含批次版本号、物料/BOM、处方生命周期状态,
// 版本/物料/作废处方三条规则不做评估 (evaluated() == false),
// 报告的 ruleCoverage 如实列出
// ==========================================

use crate::domain::batch::BatchLineItem;
use crate::domain::formula::FormulaRecord;
use crate::domain::reconciliation::Mismatch;
use crate::domain::types::{MismatchType, Severity};
use crate::i18n::t_in;

/// 批次校验规则
pub trait BatchRule: Send + Sync {
    /// 规则标识 (与差异类别一致)
    fn mismatch_type(&self) -> MismatchType;

    /// 当前数据是否足以评估本规则
    fn evaluated(&self) -> bool {
        true
    }

    fn check(&self, batch: &BatchLineItem, formula: &FormulaRecord, locale: &str)
        -> Option<Mismatch>;
}

// ==========================================
// 版本一致性
// ==========================================
// 批次无版本字段,恒为 valid
pub struct RevisionRule;

impl BatchRule for RevisionRule {
    fn mismatch_type(&self) -> MismatchType {
        MismatchType::RevisionMismatch
    }

    fn evaluated(&self) -> bool {
        false
    }

    fn check(&self, _batch: &BatchLineItem, _formula: &FormulaRecord, _locale: &str) -> Option<Mismatch> {
        None
    }
}

// ==========================================
// 生产许可证 (MFC) 一致性
// ==========================================
// 双方均已知且不同 -> critical
pub struct MfcConsistencyRule;

impl BatchRule for MfcConsistencyRule {
    fn mismatch_type(&self) -> MismatchType {
        MismatchType::MfcMismatch
    }

    fn check(&self, batch: &BatchLineItem, formula: &FormulaRecord, locale: &str) -> Option<Mismatch> {
        if !batch
            .mfg_lic_no
            .conflicts_with(&formula.manufacturing_license_no)
        {
            return None;
        }

        Some(Mismatch {
            mismatch_type: MismatchType::MfcMismatch,
            description: t_in(
                locale,
                "recon.mismatch.mfc",
                &[
                    ("batch_license", batch.mfg_lic_no.as_str()),
                    ("formula_license", formula.manufacturing_license_no.as_str()),
                ],
            ),
            severity: Severity::Critical,
        })
    }
}

// ==========================================
// 物料一致性
// ==========================================
// 批次未附带物料/BOM 数据
pub struct MaterialConsistencyRule;

impl BatchRule for MaterialConsistencyRule {
    fn mismatch_type(&self) -> MismatchType {
        MismatchType::MaterialMismatch
    }

    fn evaluated(&self) -> bool {
        false
    }

    fn check(&self, _batch: &BatchLineItem, _formula: &FormulaRecord, _locale: &str) -> Option<Mismatch> {
        None
    }
}

// ==========================================
// 作废处方使用
// ==========================================
// 处方无生命周期状态字段
pub struct ObsoleteFormulaRule;

impl BatchRule for ObsoleteFormulaRule {
    fn mismatch_type(&self) -> MismatchType {
        MismatchType::ObsoleteFormula
    }

    fn evaluated(&self) -> bool {
        false
    }

    fn check(&self, _batch: &BatchLineItem, _formula: &FormulaRecord, _locale: &str) -> Option<Mismatch> {
        None
    }
}

/// 固定顺序的默认规则集
pub fn default_rules() -> Vec<Box<dyn BatchRule>> {
    vec![
        Box::new(RevisionRule),
        Box::new(MfcConsistencyRule),
        Box::new(MaterialConsistencyRule),
        Box::new(ObsoleteFormulaRule),
    ]
}

/// 依次执行规则并收集差异
pub fn run_rules(
    rules: &[Box<dyn BatchRule>],
    batch: &BatchLineItem,
    formula: &FormulaRecord,
    locale: &str,
) -> Vec<Mismatch> {
    rules
        .iter()
        .filter_map(|rule| rule.check(batch, formula, locale))
        .collect()
}
