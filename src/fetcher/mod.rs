//! 主请求模块：获取目标URL的响应快照
//! `Fetcher` 为可替换接口，默认实现基于 reqwest

use std::time::Duration;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, USER_AGENT};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::DetectorConfig;
use crate::error::{WebTechError, WtResult};
use crate::extractor::{DocumentParser, HtmlDocument};
use crate::utils::HeaderConverter;

/// 原始HTTP响应（主请求的结果）
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// 跟随重定向后的最终URL
    pub final_url: Url,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

/// 单次HTTP交换的只读快照 + 解析后的文档树
#[derive(Debug, Clone)]
pub struct FetchResult {
    url: Url,
    status: u16,
    headers: HeaderMap,
    body: String,
    body_lower: String,
    document: HtmlDocument,
}

impl FetchResult {
    /// 由原始响应构建快照（文档解析在此一次完成）
    pub fn new(response: RawResponse, parser: &dyn DocumentParser) -> Self {
        let document = parser.parse(&response.body);
        let body_lower = response.body.to_lowercase();
        Self {
            url: response.final_url,
            status: response.status,
            headers: response.headers,
            body: response.body,
            body_lower,
            document,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 忽略大小写读取Header
    pub fn header(&self, name: &str) -> Option<String> {
        HeaderConverter::get(&self.headers, name).map(|v| v.into_owned())
    }

    /// 同名多值Header合并后的值
    pub fn header_joined(&self, name: &str) -> Option<String> {
        HeaderConverter::joined(&self.headers, name)
    }

    pub fn has_header(&self, name: &str) -> bool {
        HeaderConverter::contains(&self.headers, name)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// 小写化后的响应体（子串匹配忽略大小写时使用）
    pub fn body_lower(&self) -> &str {
        &self.body_lower
    }

    pub fn document(&self) -> &HtmlDocument {
        &self.document
    }
}

/// 主请求接口
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> WtResult<RawResponse>;
}

/// 基于 reqwest 的HTTP获取器
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &DetectorConfig) -> WtResult<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .connect_timeout(config.fetch_timeout)
            .build()?;
        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            timeout: config.fetch_timeout,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> WtResult<RawResponse> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| WebTechError::FetchFailure(format!("{}: {}", url, e)))?;

        let final_url = response.url().clone();
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| WebTechError::FetchFailure(format!("读取响应体失败 {}: {}", url, e)))?;

        debug!(
            "Fetched {} | status: {} | header count: {} | body length: {}",
            final_url,
            status,
            headers.len(),
            body.len()
        );

        Ok(RawResponse {
            final_url,
            status,
            headers,
            body,
        })
    }
}
