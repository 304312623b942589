//! 签名与标签数据模型定义
//! 仅存储数据，无任何匹配逻辑，支持序列化/反序列化

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use serde::{Deserialize, Serialize};

use crate::error::{WebTechError, WtResult};

/// 单个技术的签名：每个证据通道一组可选指示器
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologySignature {
    pub name: String,
    /// 响应体子串（忽略大小写）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub html: Vec<String>,
    /// `<meta name="generator">` content 子串
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_generator: Option<String>,
    /// `<script src>` 子串
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<String>,
    /// 样式表 `href` 子串
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<String>,
    /// Header名称 -> 期望的值子串，全部满足才算命中
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// 后台路径，可访问（HTTP 200）即视为证据
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_path: Option<String>,
}

impl TechnologySignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn html<I, S>(mut self, indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.html = indicators.into_iter().map(Into::into).collect();
        self
    }

    pub fn meta_generator(mut self, generator: impl Into<String>) -> Self {
        self.meta_generator = Some(generator.into());
        self
    }

    pub fn scripts<I, S>(mut self, indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scripts = indicators.into_iter().map(Into::into).collect();
        self
    }

    pub fn styles<I, S>(mut self, indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.styles = indicators.into_iter().map(Into::into).collect();
        self
    }

    pub fn header(mut self, name: impl Into<String>, expected: impl Into<String>) -> Self {
        self.headers.insert(name.into(), expected.into());
        self
    }

    pub fn admin_path(mut self, path: impl Into<String>) -> Self {
        self.admin_path = Some(path.into());
        self
    }

    /// 是否至少有一个非空指示器
    pub fn has_indicators(&self) -> bool {
        self.html.iter().any(|s| !s.is_empty())
            || self.meta_generator.as_deref().is_some_and(|s| !s.is_empty())
            || self.scripts.iter().any(|s| !s.is_empty())
            || self.styles.iter().any(|s| !s.is_empty())
            || !self.headers.is_empty()
            || self.admin_path.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// 校验签名：名称非空且至少一个通道有指示器
    pub fn validate(&self) -> WtResult<()> {
        if self.name.trim().is_empty() {
            return Err(WebTechError::InvalidSignature("签名名称为空".to_string()));
        }
        if !self.has_indicators() {
            return Err(WebTechError::InvalidSignature(format!(
                "签名 {} 没有任何指示器",
                self.name
            )));
        }
        if let Some(path) = &self.admin_path {
            if !path.starts_with('/') {
                return Err(WebTechError::InvalidSignature(format!(
                    "签名 {} 的后台路径必须以 / 开头：{}",
                    self.name, path
                )));
            }
        }
        Ok(())
    }
}

/// 检测标签（技术名称或特征描述，可带参数）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// 带版本的标签，版本为空时退化为纯名称（如 `PHP 8.2.1` / `PHP`）
    pub fn versioned(name: &str, version: Option<&str>) -> Self {
        match version {
            Some(v) if !v.trim().is_empty() => Self(format!("{} {}", name, v.trim())),
            _ => Self(name.to_string()),
        }
    }

    /// `前缀: 值` 形式的参数化标签（如 `SSL/TLS: TLSv1.3`）
    pub fn keyed(key: &str, value: impl fmt::Display) -> Self {
        Self(format!("{}: {}", key, value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for Label {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Label {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// 标签集合：重复标签自动合并，枚举顺序无语义
pub type LabelSet = BTreeSet<Label>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_without_indicators_is_rejected() {
        let sig = TechnologySignature::new("Empty");
        assert!(!sig.has_indicators());
        assert!(matches!(sig.validate(), Err(WebTechError::InvalidSignature(_))));

        let blank = TechnologySignature::new("Blank").html([""]);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_admin_path_must_be_absolute() {
        let sig = TechnologySignature::new("Ghost").admin_path("ghost/");
        assert!(sig.validate().is_err());
        let sig = TechnologySignature::new("Ghost").admin_path("/ghost/");
        assert!(sig.validate().is_ok());
    }

    #[test]
    fn test_versioned_label() {
        assert_eq!(Label::versioned("PHP", Some("8.2.1")), "PHP 8.2.1");
        assert_eq!(Label::versioned("PHP", Some("  ")), "PHP");
        assert_eq!(Label::versioned("PHP", None), "PHP");
        assert_eq!(Label::keyed("SSL/TLS", "TLSv1.3"), "SSL/TLS: TLSv1.3");
    }

    #[test]
    fn test_signature_json_shape() {
        let json = r#"{"name":"Ghost","html":["ghost-"],"headers":{"X-Ghost-Cache-Status":""}}"#;
        let sig: TechnologySignature = serde_json::from_str(json).unwrap();
        assert_eq!(sig.html, vec!["ghost-"]);
        assert!(sig.meta_generator.is_none());
        assert_eq!(sig.headers.get("X-Ghost-Cache-Status").map(String::as_str), Some(""));
        assert!(sig.validate().is_ok());
    }
}
