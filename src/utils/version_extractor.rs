//! 版本提取工具模块
//! 从 `产品/版本` 形式的Header值（如 `X-Powered-By: PHP/8.2.1`）中提取版本号

use once_cell::sync::Lazy;
use regex::Regex;

/// 合法版本号：数字开头，允许点号、连字符等常见后缀
static VERSION_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9][0-9A-Za-z.\-+~_]*$").expect("version shape regex is valid")
});

/// 版本提取工具类
pub struct VersionExtractor;

impl VersionExtractor {
    /// 提取紧跟在 `product/` 之后的版本号
    ///
    /// - `PHP/8.2.1` -> `Some("8.2.1")`
    /// - `PHP/7.4.3, ASP.NET` -> `Some("7.4.3")`
    /// - `PHP` -> `None`
    pub fn after_product(value: &str, product: &str) -> Option<String> {
        let start = value.find(product)? + product.len();
        let rest = value[start..].strip_prefix('/')?;
        let token: String = rest
            .chars()
            .take_while(|c| !c.is_whitespace() && !matches!(c, ',' | ';' | '(' | ')' | '/'))
            .collect();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }

    /// 是否为数字开头的版本号形态
    pub fn looks_like_version(token: &str) -> bool {
        VERSION_SHAPE.is_match(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_php_version() {
        assert_eq!(VersionExtractor::after_product("PHP/8.2.1", "PHP"), Some("8.2.1".to_string()));
        assert_eq!(
            VersionExtractor::after_product("PHP/7.4.3-1ubuntu1 (Ubuntu)", "PHP"),
            Some("7.4.3-1ubuntu1".to_string())
        );
    }

    #[test]
    fn test_product_in_list() {
        assert_eq!(
            VersionExtractor::after_product("Express, PHP/8.0.30; mod", "PHP"),
            Some("8.0.30".to_string())
        );
    }

    #[test]
    fn test_missing_version() {
        assert_eq!(VersionExtractor::after_product("PHP", "PHP"), None);
        assert_eq!(VersionExtractor::after_product("PHP/", "PHP"), None);
        assert_eq!(VersionExtractor::after_product("ASP.NET", "PHP"), None);
    }

    #[test]
    fn test_version_shape() {
        assert!(VersionExtractor::looks_like_version("8.2.1"));
        assert!(VersionExtractor::looks_like_version("7.4.3-1ubuntu1"));
        assert!(!VersionExtractor::looks_like_version("hidden"));
        assert!(!VersionExtractor::looks_like_version(""));
    }
}
