// ==========================================
// 药品批记录对账引擎 - 领域类型定义
// ==========================================
// 职责: 可选字段哨兵类型 + 对账结果中的枚举
// 红线: 缺失字段一律显式为 Unknown,禁止魔法字符串比较
// ==========================================

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Unknown 在报表中的展示值
pub const UNKNOWN_MARKER: &str = "N/A";

/// 判断原始文本是否为"未知"占位
fn is_unknown_token(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || ["N/A", "NA", "UNKNOWN"]
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
}

// ==========================================
// Recorded - 可选字段 (已知值 / 未知)
// ==========================================
// 两个 Unknown 之间既不"匹配"也不"冲突"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Recorded<T> {
    Known(T),
    Unknown,
}

impl<T> Default for Recorded<T> {
    fn default() -> Self {
        Recorded::Unknown
    }
}

impl<T> Recorded<T> {
    /// 已知值的引用
    pub fn known(&self) -> Option<&T> {
        match self {
            Recorded::Known(value) => Some(value),
            Recorded::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Recorded::Known(_))
    }

    pub fn is_unknown(&self) -> bool {
        !self.is_known()
    }

    /// 当前值未知时回退到 fallback
    pub fn or(self, fallback: Recorded<T>) -> Recorded<T> {
        match self {
            Recorded::Known(_) => self,
            Recorded::Unknown => fallback,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Recorded<U> {
        match self {
            Recorded::Known(value) => Recorded::Known(f(value)),
            Recorded::Unknown => Recorded::Unknown,
        }
    }
}

impl<T: PartialEq> Recorded<T> {
    /// 双方均已知且不相等时才视为冲突
    pub fn conflicts_with(&self, other: &Recorded<T>) -> bool {
        match (self, other) {
            (Recorded::Known(a), Recorded::Known(b)) => a != b,
            _ => false,
        }
    }
}

impl Recorded<String> {
    /// 从原始文本构造 (去除首尾空白,识别占位值)
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some(text) if !is_unknown_token(text) => Recorded::Known(text.trim().to_string()),
            _ => Recorded::Unknown,
        }
    }

    /// 已知值或展示占位
    pub fn as_str(&self) -> &str {
        match self {
            Recorded::Known(value) => value.as_str(),
            Recorded::Unknown => UNKNOWN_MARKER,
        }
    }
}

impl From<&str> for Recorded<String> {
    fn from(raw: &str) -> Self {
        Recorded::from_raw(Some(raw))
    }
}

impl From<Option<String>> for Recorded<String> {
    fn from(raw: Option<String>) -> Self {
        Recorded::from_raw(raw.as_deref())
    }
}

impl<T: fmt::Display> fmt::Display for Recorded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recorded::Known(value) => write!(f, "{}", value),
            Recorded::Unknown => write!(f, "{}", UNKNOWN_MARKER),
        }
    }
}

impl<T: Serialize> Serialize for Recorded<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Recorded::Known(value) => value.serialize(serializer),
            Recorded::Unknown => serializer.serialize_str(UNKNOWN_MARKER),
        }
    }
}

/// 宽松的原始标量: 数字/布尔按文本保留,其余形态视为未知
#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Other(IgnoredAny),
}

impl<'de> Deserialize<'de> for Recorded<String> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawScalar>::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawScalar::Text(text)) => Recorded::from_raw(Some(&text)),
            Some(RawScalar::Int(n)) => Recorded::Known(n.to_string()),
            Some(RawScalar::Float(n)) => Recorded::Known(n.to_string()),
            Some(RawScalar::Bool(b)) => Recorded::Known(b.to_string()),
            Some(RawScalar::Other(_)) | None => Recorded::Unknown,
        })
    }
}

/// 宽松的标识字段: 缺失/null/占位值读为空串,数字按文本保留
pub fn deserialize_lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Recorded::<String>::deserialize(deserializer)? {
        Recorded::Known(id) => id,
        Recorded::Unknown => String::new(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientItem<T> {
    Item(T),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientList<T> {
    List(Vec<LenientItem<T>>),
    Other(IgnoredAny),
}

/// 宽松的数组字段: 非数组读为空,数组中无法解析的元素读为默认值 (全部字段 Unknown)
pub fn deserialize_lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(match Option::<LenientList<T>>::deserialize(deserializer)? {
        Some(LenientList::List(items)) => items
            .into_iter()
            .map(|item| match item {
                LenientItem::Item(value) => value,
                LenientItem::Other(_) => T::default(),
            })
            .collect(),
        Some(LenientList::Other(_)) | None => Vec::new(),
    })
}

// ==========================================
// 批次类型 (Export / Import)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BatchType {
    Export,
    Import,
    #[default]
    #[serde(rename = "N/A")]
    Unknown,
}

impl BatchType {
    /// 从原始字段解析 (大小写不敏感)
    pub fn parse(raw: &Recorded<String>) -> Self {
        match raw.known().map(|s| s.to_ascii_lowercase()) {
            Some(value) if value == "export" => BatchType::Export,
            Some(value) if value == "import" => BatchType::Import,
            _ => BatchType::Unknown,
        }
    }
}

impl fmt::Display for BatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchType::Export => write!(f, "Export"),
            BatchType::Import => write!(f, "Import"),
            BatchType::Unknown => write!(f, "{}", UNKNOWN_MARKER),
        }
    }
}

// ==========================================
// 批次状态
// ==========================================
// 未提供状态的批次按"在用"统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    InUse,
    Cancelled,
    Rejected,
    #[default]
    Unknown,
}

impl BatchStatus {
    pub fn parse(raw: &Recorded<String>) -> Self {
        let Some(value) = raw.known() else {
            return BatchStatus::Unknown;
        };
        match value.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "in_use" | "inuse" | "active" | "released" => BatchStatus::InUse,
            "cancelled" | "canceled" => BatchStatus::Cancelled,
            "rejected" => BatchStatus::Rejected,
            _ => BatchStatus::Unknown,
        }
    }

    pub fn counts_as_in_use(&self) -> bool {
        matches!(self, BatchStatus::InUse | BatchStatus::Unknown)
    }
}

// ==========================================
// 版本核对结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionMatch {
    Valid,
    OldRevision,
    InvalidRevision,
    Unknown,
}

// ==========================================
// 差异类别 / 严重度
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchType {
    RevisionMismatch,
    MfcMismatch,
    MaterialMismatch,
    ObsoleteFormula,
}

impl fmt::Display for MismatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchType::RevisionMismatch => write!(f, "revision_mismatch"),
            MismatchType::MfcMismatch => write!(f, "mfc_mismatch"),
            MismatchType::MaterialMismatch => write!(f, "material_mismatch"),
            MismatchType::ObsoleteFormula => write!(f, "obsolete_formula"),
        }
    }
}

// 顺序: Minor < Major < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Minor => write!(f, "minor"),
            Severity::Major => write!(f, "major"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

// ==========================================
// 处方对账状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    FullyReconciled,
    PartiallyReconciled,
    NotReconciled,
    NoBatches,
}

impl ReconciliationStatus {
    /// 由批次统计唯一确定状态
    pub fn classify(total_batches: usize, reconciled: usize, mismatched: usize) -> Self {
        if total_batches == 0 {
            ReconciliationStatus::NoBatches
        } else if mismatched == 0 {
            ReconciliationStatus::FullyReconciled
        } else if reconciled > 0 {
            ReconciliationStatus::PartiallyReconciled
        } else {
            ReconciliationStatus::NotReconciled
        }
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationStatus::FullyReconciled => write!(f, "fully_reconciled"),
            ReconciliationStatus::PartiallyReconciled => write!(f, "partially_reconciled"),
            ReconciliationStatus::NotReconciled => write!(f, "not_reconciled"),
            ReconciliationStatus::NoBatches => write!(f, "no_batches"),
        }
    }
}

// ==========================================
// 孤儿批次合规风险
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceRisk {
    High,
    Medium,
}

impl fmt::Display for ComplianceRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceRisk::High => write!(f, "high"),
            ComplianceRisk::Medium => write!(f, "medium"),
        }
    }
}

// ==========================================
// 整改建议
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    MfcCorrection,
    UrgentReview,
    FormulaCleanup,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_from_raw_sentinels() {
        assert_eq!(Recorded::from_raw(Some("  LIC1 ")), Recorded::Known("LIC1".to_string()));
        assert_eq!(Recorded::<String>::from_raw(Some("N/A")), Recorded::Unknown);
        assert_eq!(Recorded::<String>::from_raw(Some("unknown")), Recorded::Unknown);
        assert_eq!(Recorded::<String>::from_raw(Some("   ")), Recorded::Unknown);
        assert_eq!(Recorded::<String>::from_raw(None), Recorded::Unknown);
    }

    #[test]
    fn test_code_like_literals_stay_known() {
        // 只有空白、N/A、NA、UNKNOWN 是占位值
        for raw in ["-", "NULL", "null", "NONE"] {
            assert_eq!(
                Recorded::from_raw(Some(raw)),
                Recorded::Known(raw.to_string()),
                "{raw} 不应视为未知"
            );
        }
        assert_eq!(Recorded::<String>::from_raw(Some(" na ")), Recorded::Unknown);
    }

    #[test]
    fn test_lenient_list_and_id() {
        #[derive(Debug, Default, PartialEq, Deserialize)]
        struct Item {
            #[serde(default)]
            code: Recorded<String>,
        }

        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "deserialize_lenient_id")]
            id: String,
            #[serde(default, deserialize_with = "deserialize_lenient_list")]
            items: Vec<Item>,
        }

        let holder: Holder =
            serde_json::from_str(r#"{"id": 42, "items": [null, {"code": "P1"}, "junk", 7]}"#).unwrap();
        assert_eq!(holder.id, "42");
        assert_eq!(
            holder.items,
            vec![
                Item::default(),
                Item { code: "P1".into() },
                Item::default(),
                Item::default(),
            ]
        );

        let holder: Holder = serde_json::from_str(r#"{"id": null, "items": {"code": "P1"}}"#).unwrap();
        assert_eq!(holder.id, "");
        assert!(holder.items.is_empty());

        let holder: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(holder.id, "");
        assert!(holder.items.is_empty());
    }

    #[test]
    fn test_unknowns_never_conflict_or_match() {
        let unknown: Recorded<String> = Recorded::Unknown;
        let known: Recorded<String> = "LIC1".into();
        assert!(!unknown.conflicts_with(&Recorded::Unknown));
        assert!(!unknown.conflicts_with(&known));
        assert!(!known.conflicts_with(&unknown));
        assert!(known.conflicts_with(&"LIC2".into()));
        assert!(!known.conflicts_with(&"LIC1".into()));
    }

    #[test]
    fn test_recorded_serde_lenient() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default)]
            a: Recorded<String>,
            #[serde(default)]
            b: Recorded<String>,
            #[serde(default)]
            c: Recorded<String>,
            #[serde(default)]
            d: Recorded<String>,
        }
        let row: Row = serde_json::from_str(r#"{"a": 500, "b": null, "c": {"x": 1}}"#).unwrap();
        assert_eq!(row.a, Recorded::Known("500".to_string()));
        assert_eq!(row.b, Recorded::Unknown);
        assert_eq!(row.c, Recorded::Unknown);
        assert_eq!(row.d, Recorded::Unknown);

        let json = serde_json::to_string(&Recorded::<String>::Unknown).unwrap();
        assert_eq!(json, "\"N/A\"");
    }

    #[test]
    fn test_status_classification_table() {
        assert_eq!(ReconciliationStatus::classify(0, 0, 0), ReconciliationStatus::NoBatches);
        assert_eq!(ReconciliationStatus::classify(3, 3, 0), ReconciliationStatus::FullyReconciled);
        assert_eq!(
            ReconciliationStatus::classify(3, 1, 2),
            ReconciliationStatus::PartiallyReconciled
        );
        assert_eq!(ReconciliationStatus::classify(3, 0, 3), ReconciliationStatus::NotReconciled);
    }

    #[test]
    fn test_batch_type_and_status_parse() {
        assert_eq!(BatchType::parse(&"EXPORT".into()), BatchType::Export);
        assert_eq!(BatchType::parse(&"import".into()), BatchType::Import);
        assert_eq!(BatchType::parse(&Recorded::Unknown), BatchType::Unknown);
        assert_eq!(BatchStatus::parse(&"Cancelled".into()), BatchStatus::Cancelled);
        assert_eq!(BatchStatus::parse(&"in use".into()), BatchStatus::InUse);
        assert!(BatchStatus::Unknown.counts_as_in_use());
        assert!(!BatchStatus::Rejected.counts_as_in_use());
    }
}
