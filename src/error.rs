//! 全局错误类型定义

use thiserror::Error;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use trust_dns_resolver::error::ResolveError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum WebTechError {
    // 主请求错误（对本次检测是致命的）
    #[error("无法分析该URL：{0}")]
    FetchFailure(String),

    // 探针相关错误（仅在探针内部消化，不向调用方抛出）
    #[error("探针[{probe}]执行失败：{reason}")]
    ProbeFailure { probe: &'static str, reason: String },
    #[error("操作超时：{0}")]
    Timeout(String),
    #[error("TLS握手失败：{0}")]
    TlsError(String),
    #[error("DNS解析失败：{0}")]
    DnsError(#[from] ResolveError),

    // 签名库相关错误
    #[error("无效签名：{0}")]
    InvalidSignature(String),
    #[error("签名库加载失败：{0}")]
    RegistryLoadError(String),

    // 网络相关错误
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),

    #[error("检测器未初始化")]
    DetectorNotInitialized,
}

impl WebTechError {
    /// 构造探针失败错误
    pub fn probe(probe: &'static str, reason: impl Into<String>) -> Self {
        Self::ProbeFailure {
            probe,
            reason: reason.into(),
        }
    }

    /// 是否为主请求失败（调用方应视为空结果）
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchFailure(_))
    }
}

// 全局Result类型
pub type WtResult<T> = Result<T, WebTechError>;
