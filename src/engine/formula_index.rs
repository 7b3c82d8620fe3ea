// ==========================================
// 药品批记录对账引擎 - 处方索引构建
// ==========================================
// 输入: 处方集合 (按给定顺序)
// 输出: 产品编码 -> 处方, 处方卡号 -> 处方
// ==========================================
// 红线: 主编码后写覆盖; 次级编码先到先得,后续处方不得覆盖
// ==========================================

use crate::domain::formula::FormulaRecord;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 产品编码索引项
#[derive(Debug, Clone, Copy)]
pub struct ProductCodeEntry<'a> {
    /// 处方在输入集合中的位置 (分组键)
    pub position: usize,
    pub formula: &'a FormulaRecord,
    pub is_main_product: bool,
    /// 经灌装/工艺阶段登记时的编码
    pub filling_product_code: Option<&'a str>,
}

/// 主编码冲突记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainCodeCollision {
    pub product_code: String,
    pub replaced_formula_id: String,
    pub winning_formula_id: String,
}

// ==========================================
// FormulaIndex - 处方查找结构
// ==========================================
// 构建后不可变
#[derive(Debug, Default)]
pub struct FormulaIndex<'a> {
    product_code_to_formula: HashMap<&'a str, ProductCodeEntry<'a>>,
    mfc_to_formula: HashMap<&'a str, &'a FormulaRecord>,
    main_code_collisions: Vec<MainCodeCollision>,
}

impl<'a> FormulaIndex<'a> {
    /// 按输入顺序一次遍历构建索引
    pub fn build(formulas: &'a [FormulaRecord]) -> Self {
        let mut product_code_to_formula: HashMap<&'a str, ProductCodeEntry<'a>> = HashMap::new();
        let mut mfc_to_formula: HashMap<&'a str, &'a FormulaRecord> = HashMap::new();
        let mut main_code_collisions = Vec::new();

        for (position, formula) in formulas.iter().enumerate() {
            if let Some(mfc) = formula.master_card_no.known() {
                mfc_to_formula.insert(mfc.as_str(), formula);
            }

            if let Some(main_code) = formula.main_product_code.known() {
                let entry = ProductCodeEntry {
                    position,
                    formula,
                    is_main_product: true,
                    filling_product_code: None,
                };
                if let Some(previous) = product_code_to_formula.insert(main_code.as_str(), entry) {
                    if previous.is_main_product && previous.position != position {
                        warn!(
                            product_code = %main_code,
                            replaced_formula_id = %previous.formula.formula_id,
                            winning_formula_id = %formula.formula_id,
                            "主产品编码重复,后登记的处方覆盖先前映射"
                        );
                        main_code_collisions.push(MainCodeCollision {
                            product_code: main_code.clone(),
                            replaced_formula_id: previous.formula.formula_id.clone(),
                            winning_formula_id: formula.formula_id.clone(),
                        });
                    }
                }
            }

            for code in formula.filling_product_codes() {
                product_code_to_formula
                    .entry(code)
                    .or_insert(ProductCodeEntry {
                        position,
                        formula,
                        is_main_product: false,
                        filling_product_code: Some(code),
                    });
            }
        }

        debug!(
            formulas = formulas.len(),
            product_codes = product_code_to_formula.len(),
            master_cards = mfc_to_formula.len(),
            "处方索引构建完成"
        );

        Self {
            product_code_to_formula,
            mfc_to_formula,
            main_code_collisions,
        }
    }

    /// 按产品编码查找
    pub fn lookup(&self, product_code: &str) -> Option<&ProductCodeEntry<'a>> {
        self.product_code_to_formula.get(product_code)
    }

    /// 按处方卡号查找
    pub fn formula_by_master_card(&self, master_card_no: &str) -> Option<&'a FormulaRecord> {
        self.mfc_to_formula.get(master_card_no).copied()
    }

    pub fn product_code_count(&self) -> usize {
        self.product_code_to_formula.len()
    }

    pub fn master_card_count(&self) -> usize {
        self.mfc_to_formula.len()
    }

    pub fn main_code_collisions(&self) -> &[MainCodeCollision] {
        &self.main_code_collisions
    }
}
