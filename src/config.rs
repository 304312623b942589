//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;
use std::time::Duration;

/// 默认 User-Agent
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; rswebtech/0.1; +https://github.com/FlyfishSec/rswebtech)";

/// 检测器配置
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    // 主请求 User-Agent
    pub user_agent: String,
    // 主请求超时
    pub fetch_timeout: Duration,
    // 后台路径探测超时（单次请求）
    pub admin_timeout: Duration,
    // TLS 连接 + 握手超时
    pub tls_timeout: Duration,
    // TLS 探测端口
    pub tls_port: u16,
    // DNS 查询超时
    pub dns_timeout: Duration,
    // 单个探针的总预算，超出即按失败处理
    pub probe_budget: Duration,
    // 自定义签名库文件（JSON），为空时使用内置签名库
    pub signature_file: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: Duration::from_secs(10),
            admin_timeout: Duration::from_secs(5),
            tls_timeout: Duration::from_secs(5),
            tls_port: 443,
            dns_timeout: Duration::from_secs(5),
            probe_budget: Duration::from_secs(15),
            signature_file: None,
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> DetectorConfig {
        DetectorConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（链式 API）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: DetectorConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    pub fn admin_timeout(mut self, timeout: Duration) -> Self {
        self.config.admin_timeout = timeout;
        self
    }

    pub fn tls_timeout(mut self, timeout: Duration) -> Self {
        self.config.tls_timeout = timeout;
        self
    }

    pub fn tls_port(mut self, port: u16) -> Self {
        self.config.tls_port = port;
        self
    }

    pub fn dns_timeout(mut self, timeout: Duration) -> Self {
        self.config.dns_timeout = timeout;
        self
    }

    pub fn probe_budget(mut self, budget: Duration) -> Self {
        self.config.probe_budget = budget;
        self
    }

    pub fn signature_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.signature_file = Some(path.into());
        self
    }

    /// 所有网络超时统一设置（CLI `--timeout`）
    pub fn all_timeouts(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self.config.admin_timeout = timeout;
        self.config.tls_timeout = timeout;
        self.config.dns_timeout = timeout;
        self.config.probe_budget = self.config.probe_budget.max(timeout.saturating_mul(3));
        self
    }

    pub fn build(self) -> DetectorConfig {
        self.config
    }
}
