//! 提取模块：HTML文档树与可替换的解析器接口
pub mod html_extractor;

pub use self::html_extractor::{DocumentParser, Element, Html5everParser, HtmlDocument, HtmlExtractor};
