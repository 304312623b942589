//! 辅助探针模块：需要独立网络请求的证据来源
//! 每个探针各自持有连接并自行设置超时；失败只影响自身，由检测器转换为兜底标签

pub mod admin;
pub mod dns;
pub mod tls;

use std::sync::Arc;
use async_trait::async_trait;
use url::Url;

use crate::error::{WebTechError, WtResult};
use crate::rule::{LabelSet, Registry};

pub use self::admin::AdminPathProbe;
pub use self::dns::DnsMailProbe;
pub use self::tls::TlsInspector;

/// 探针输入：目标URL及其派生信息
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub url: Url,
    /// 主机名（不含端口）
    pub host: String,
    /// `scheme://host[:port]`，不带结尾斜杠
    pub origin: String,
    pub registry: Arc<Registry>,
}

impl ProbeTarget {
    pub fn new(url: Url, registry: Arc<Registry>) -> WtResult<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| WebTechError::InvalidInput(format!("URL缺少主机名：{}", url)))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let origin = url.origin().ascii_serialization();
        Ok(Self {
            url,
            host,
            origin,
            registry,
        })
    }

    /// 主机是否为IP字面量
    pub fn host_is_ip(&self) -> bool {
        self.host.parse::<std::net::IpAddr>().is_ok()
    }
}

/// 辅助探针接口
#[async_trait]
pub trait Probe: Send + Sync {
    /// 探针名称，用于日志输出
    fn name(&self) -> &'static str;

    /// 执行探测；返回的错误只在检测器内部消化
    async fn probe(&self, target: &ProbeTarget) -> WtResult<LabelSet>;

    /// 探测失败（错误/超时/任务异常）时输出的标签，默认为空
    fn fallback(&self) -> LabelSet {
        LabelSet::new()
    }
}
