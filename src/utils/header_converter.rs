//! Header读取与格式转换工具
//! HeaderMap 本身按名称忽略大小写查找，这里统一处理非UTF8值与多值Header

use std::borrow::Cow;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use crate::error::{WebTechError, WtResult};

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// 读取Header首个非空值；非UTF8字节做有损转换
    pub fn get<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
        headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
            .find(|v| !v.trim().is_empty())
            .or_else(|| {
                headers
                    .get(name)
                    .map(|v| String::from_utf8_lossy(v.as_bytes()))
            })
    }

    /// Header是否存在（值可为空）
    pub fn contains(headers: &HeaderMap, name: &str) -> bool {
        headers.contains_key(name)
    }

    /// Header值是否包含子串（均忽略大小写）
    pub fn value_contains(headers: &HeaderMap, name: &str, expected: &str) -> bool {
        let expected = expected.to_lowercase();
        headers
            .get_all(name)
            .iter()
            .any(|v| String::from_utf8_lossy(v.as_bytes()).to_lowercase().contains(&expected))
    }

    /// 同名多值Header按 `, ` 合并为一个值（如 `PleskLin, PHP/7.4.33`）
    pub fn joined(headers: &HeaderMap, name: &str) -> Option<String> {
        let values: Vec<_> = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    /// 由 (名称, 值) 列表构造HeaderMap；非法名称/值直接报错
    pub fn from_pairs<K, V, I>(pairs: I) -> WtResult<HeaderMap>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut header_map = HeaderMap::new();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            let header_name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| WebTechError::InvalidInput(format!("无效Header名称：{}，错误：{}", key, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| WebTechError::InvalidInput(format!("无效Header值：{}，错误：{}", value, e)))?;
            header_map.append(header_name, header_value);
        }
        if header_map.len() > 1000 {
            warn!("Header count {} exceeds 1000", header_map.len());
        }
        Ok(header_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let headers = HeaderConverter::from_pairs([("Server", "Cloudflare-Edge")]).unwrap();
        assert_eq!(HeaderConverter::get(&headers, "server").as_deref(), Some("Cloudflare-Edge"));
        assert!(HeaderConverter::contains(&headers, "SERVER"));
        assert!(HeaderConverter::value_contains(&headers, "Server", "cloudflare"));
        assert!(!HeaderConverter::value_contains(&headers, "Server", "nginx"));
        assert!(!HeaderConverter::value_contains(&headers, "X-Powered-By", ""));
    }

    #[test]
    fn test_multi_value_header() {
        let headers = HeaderConverter::from_pairs([
            ("Set-Cookie", "a=1"),
            ("Set-Cookie", "b=2"),
            ("Via", ""),
        ])
        .unwrap();
        assert_eq!(
            HeaderConverter::joined(&headers, "SET-COOKIE").as_deref(),
            Some("a=1, b=2")
        );
        assert_eq!(HeaderConverter::joined(&headers, "X-Missing"), None);
        assert!(HeaderConverter::value_contains(&headers, "set-cookie", "B=2"));
        assert_eq!(HeaderConverter::get(&headers, "via").as_deref(), Some(""));
    }

    #[test]
    fn test_invalid_header_name() {
        let result = HeaderConverter::from_pairs([("Bad Header", "x")]);
        assert!(matches!(result, Err(WebTechError::InvalidInput(_))));
    }
}
