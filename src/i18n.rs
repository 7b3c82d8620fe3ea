// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// 报告文本一律显式传入 locale,不依赖全局语言状态
// ==========================================

/// 报告支持的语言
pub const SUPPORTED_LOCALES: &[&str] = &["en", "zh-CN"];

/// 默认报告语言
pub const DEFAULT_LOCALE: &str = "en";

pub fn is_supported_locale(locale: &str) -> bool {
    SUPPORTED_LOCALES.contains(&locale)
}

/// 按指定语言翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use pharma_batch_recon::i18n::t_in;
/// let msg = t_in("en", "recon.orphan.reason", &[("item_code", "X999")]);
/// ```
pub fn t_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key, locale = locale).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
