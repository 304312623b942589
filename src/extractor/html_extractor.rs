//! HTML文档提取器
//! 基于 html5ever 分词器，将HTML扁平化为可查询的元素列表与纯文本

use std::cell::RefCell;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts
};
use markup5ever::interface::Attribute;
use regex::Regex;
use tendril::StrTendril;

/// 单个元素（开始标签），标签名与属性名已由分词器转为小写
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// 属性值（首次出现）
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(n, _)| n == name)
    }

    /// 属性值是否等于期望值（忽略ASCII大小写）
    pub fn attr_eq(&self, name: &str, expected: &str) -> bool {
        self.attr(name).is_some_and(|v| v.trim().eq_ignore_ascii_case(expected))
    }

    /// 多值属性（如 rel="stylesheet preload"）是否包含某个词
    pub fn attr_has_token(&self, name: &str, token: &str) -> bool {
        self.attr(name)
            .is_some_and(|v| v.split_ascii_whitespace().any(|t| t.eq_ignore_ascii_case(token)))
    }

    pub fn is_stylesheet_link(&self) -> bool {
        self.tag == "link" && self.attr_has_token("rel", "stylesheet")
    }
}

/// 可查询的文档树（扁平元素列表 + 文本）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlDocument {
    elements: Vec<Element>,
    text: String,
}

impl HtmlDocument {
    pub fn from_parts(elements: Vec<Element>, text: impl Into<String>) -> Self {
        Self {
            elements,
            text: text.into(),
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// 文档纯文本（所有字符数据拼接）
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 按标签查找全部元素
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| e.tag == tag)
    }

    /// 查找带某属性的元素；`tag` 为 None 时不限标签
    pub fn find_by_attr<'a>(&'a self, tag: Option<&str>, attr: &str) -> Option<&'a Element> {
        self.elements
            .iter()
            .find(|e| tag.map_or(true, |t| e.tag == t) && e.has_attr(attr))
    }

    /// 查找属性名带某前缀的元素（如 aria-*）
    pub fn find_by_attr_prefix(&self, prefix: &str) -> Option<&Element> {
        self.elements
            .iter()
            .find(|e| e.attrs.iter().any(|(n, _)| n.starts_with(prefix)))
    }

    /// 查找属性值等于期望值的元素（忽略大小写）
    pub fn find_by_attr_value<'a>(
        &'a self,
        tag: &'a str,
        attr: &str,
        value: &str,
    ) -> Option<&'a Element> {
        self.find_all(tag).find(|e| e.attr_eq(attr, value))
    }

    /// 查找属性值匹配正则的元素
    pub fn find_by_attr_regex<'a>(
        &'a self,
        tag: &'a str,
        attr: &str,
        regex: &Regex,
    ) -> Option<&'a Element> {
        self.find_all(tag)
            .find(|e| e.attr(attr).is_some_and(|v| regex.is_match(v)))
    }

    /// 所有 `<meta name=...>` 的 content
    pub fn meta_contents<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.find_all("meta")
            .filter(move |e| e.attr_eq("name", name))
            .filter_map(|e| e.attr("content"))
    }

    /// 所有 `<script src>`
    pub fn script_srcs(&self) -> impl Iterator<Item = &str> {
        self.find_all("script").filter_map(|e| e.attr("src"))
    }

    /// 所有样式表链接的 href
    pub fn stylesheet_hrefs(&self) -> impl Iterator<Item = &str> {
        self.elements
            .iter()
            .filter(|e| e.is_stylesheet_link())
            .filter_map(|e| e.attr("href"))
    }
}

/// 文档解析器：响应体文本 -> 文档树，可替换实现
pub trait DocumentParser: Send + Sync {
    fn parse(&self, html: &str) -> HtmlDocument;
}

/// 基于 html5ever 分词器的默认解析器
#[derive(Debug, Default, Clone, Copy)]
pub struct Html5everParser;

impl DocumentParser for Html5everParser {
    fn parse(&self, html: &str) -> HtmlDocument {
        HtmlExtractor::new().extract(html)
    }
}

/// 分词器接收端：收集开始标签与字符数据
#[derive(Debug, Default)]
pub struct HtmlExtractor {
    elements: RefCell<Vec<Element>>,
    text: RefCell<String>,
}

impl TokenSink for HtmlExtractor {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(Tag {
                kind: TagKind::StartTag,
                name,
                attrs,
                self_closing,
                ..
            }) => {
                let tag = name.as_ref().to_string();
                self.push_element(&tag, &attrs);
                // script/style 内容按原始文本处理，避免把脚本里的 `<` 误识别为标签
                if !self_closing {
                    match tag.as_str() {
                        "script" => return TokenSinkResult::RawData(RawKind::ScriptData),
                        "style" => return TokenSinkResult::RawData(RawKind::Rawtext),
                        _ => {}
                    }
                }
            }
            Token::CharacterTokens(chars) => {
                self.text.borrow_mut().push_str(&chars);
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析HTML字符串；畸形HTML按分词器的容错规则处理，不会报错
    pub fn extract(self, html: &str) -> HtmlDocument {
        let tokenizer = Tokenizer::new(self, TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        let sink = tokenizer.sink;
        HtmlDocument {
            elements: sink.elements.into_inner(),
            text: sink.text.into_inner(),
        }
    }

    fn push_element(&self, tag: &str, attrs: &[Attribute]) {
        let attrs = attrs
            .iter()
            .map(|attr| (attr.name.local.as_ref().to_string(), attr.value.to_string()))
            .collect();
        self.elements.borrow_mut().push(Element {
            tag: tag.to_string(),
            attrs,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_extractor() {
        let html = r#"
            <script src="/jquery.min.js"></script>
            <meta name="author" content="test_user">
            <meta name="generator" content="WordPress 6.0" />
            <link rel="stylesheet" href="/css/bootstrap.min.css">
            <link rel="icon" href="/favicon.ico">
            <script src="/vue.global.js"></script>
        "#;

        let doc = Html5everParser.parse(html);

        assert_eq!(
            doc.script_srcs().collect::<Vec<_>>(),
            vec!["/jquery.min.js", "/vue.global.js"]
        );
        assert_eq!(doc.meta_contents("generator").collect::<Vec<_>>(), vec!["WordPress 6.0"]);
        assert_eq!(
            doc.stylesheet_hrefs().collect::<Vec<_>>(),
            vec!["/css/bootstrap.min.css"]
        );
    }

    #[test]
    fn test_uppercase_tags_are_normalized() {
        let html = r#"<HTML><HEAD><SCRIPT SRC="/react.js"></SCRIPT><META NAME="Generator" CONTENT="Joomla! 4"></HEAD>"#;
        let doc = Html5everParser.parse(html);
        assert_eq!(doc.script_srcs().collect::<Vec<_>>(), vec!["/react.js"]);
        assert_eq!(doc.meta_contents("generator").collect::<Vec<_>>(), vec!["Joomla! 4"]);
    }

    #[test]
    fn test_script_body_is_not_tokenized_as_tags() {
        let html = r#"<script>if (a < b) { document.write("<img src='x.webp'>"); }</script><p>Cookie consent</p>"#;
        let doc = Html5everParser.parse(html);
        assert_eq!(doc.find_all("img").count(), 0);
        assert!(doc.text().contains("Cookie consent"));
        assert!(doc.text().contains("document.write"));
    }

    #[test]
    fn test_attribute_queries() {
        let html = r#"
            <div role="navigation"></div>
            <button aria-label="close"></button>
            <a href="https://www.facebook.com/page">fb</a>
            <img src="/a.png" loading="lazy">
        "#;
        let doc = Html5everParser.parse(html);
        assert_eq!(doc.find_by_attr(None, "role").map(|e| e.tag.as_str()), Some("div"));
        assert_eq!(doc.find_by_attr_prefix("aria-").map(|e| e.tag.as_str()), Some("button"));
        assert!(doc.find_by_attr_value("img", "loading", "LAZY").is_some());
        let re = Regex::new(r"facebook\.com").unwrap();
        assert!(doc.find_by_attr_regex("a", "href", &re).is_some());
        assert!(doc.find_by_attr(Some("span"), "role").is_none());
    }

    #[test]
    fn test_malformed_html_does_not_fail() {
        let doc = Html5everParser.parse(r#"<meta name="generator" content=<<<><script src="#);
        assert!(doc.meta_contents("viewport").next().is_none());
        let empty = Html5everParser.parse("");
        assert!(empty.elements().is_empty());
        assert!(empty.text().is_empty());
    }
}
