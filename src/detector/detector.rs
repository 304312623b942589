//! Tech detector core module
//! 技术检测器核心
//! 核心职责：
//! 1. 发起主请求并构建只读快照
//! 2. 并发执行网络探针（扇出/汇合，单个探针失败只影响自身）
//! 3. 执行通道匹配器与响应启发式探测
//! 4. 合并所有标签（集合去重）

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use super::analyzer::run_channel_matchers;
use super::heuristics::run_response_analyzers;
use crate::config::DetectorConfig;
use crate::error::{WebTechError, WtResult};
use crate::extractor::{DocumentParser, Html5everParser};
use crate::fetcher::{FetchResult, Fetcher, HttpFetcher};
use crate::probe::{AdminPathProbe, DnsMailProbe, Probe, ProbeTarget, TlsInspector};
use crate::rule::{Label, LabelSet, Registry, RegistryLoader};

/// 单次检测结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectResult {
    /// 调用方传入的URL
    pub url: String,
    /// 跟随重定向后的最终URL
    pub final_url: String,
    pub status: u16,
    pub labels: LabelSet,
}

impl DetectResult {
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.as_str() == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// 技术检测器
/// - registry: 只读签名库（Arc共享，所有检测共用）
/// - fetcher / parser: 可替换的主请求与文档解析实现
/// - probes: 需要独立网络请求的辅助探针
#[derive(Clone)]
pub struct TechDetector {
    registry: Arc<Registry>,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn DocumentParser>,
    probes: Vec<Arc<dyn Probe>>,
    config: DetectorConfig,
}

impl std::fmt::Debug for TechDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TechDetector")
            .field("signatures", &self.registry.len())
            .field("probes", &self.probe_names())
            .field("config", &self.config)
            .finish()
    }
}

impl TechDetector {
    /// 按配置创建检测器：加载签名库，使用默认HTTP获取器与全部默认探针
    pub async fn new(config: DetectorConfig) -> WtResult<Self> {
        let registry = RegistryLoader::load(&config).await?;
        Self::with_registry(registry, config)
    }

    /// 使用内存中的签名库创建检测器
    pub fn with_registry(registry: Arc<Registry>, config: DetectorConfig) -> WtResult<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config)?);
        let probes = Self::default_probes(&config)?;
        Ok(Self {
            registry,
            fetcher,
            parser: Arc::new(Html5everParser),
            probes,
            config,
        })
    }

    /// 默认探针：后台路径 / TLS / DNS MX
    pub fn default_probes(config: &DetectorConfig) -> WtResult<Vec<Arc<dyn Probe>>> {
        Ok(vec![
            Arc::new(AdminPathProbe::new(config)?),
            Arc::new(TlsInspector::new(config)?),
            Arc::new(DnsMailProbe::new(config)),
        ])
    }

    /// 替换主请求实现
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// 替换文档解析实现
    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    /// 替换全部探针
    pub fn with_probes(mut self, probes: Vec<Arc<dyn Probe>>) -> Self {
        self.probes = probes;
        self
    }

    /// 追加一个探针
    pub fn add_probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn probe_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// 解析并校验目标URL（必须带 http/https scheme）
    pub fn parse_target(url: &str) -> WtResult<Url> {
        let parsed = Url::parse(url.trim())?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(WebTechError::InvalidInput(format!(
                "不支持的URL协议：{}",
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none() {
            return Err(WebTechError::InvalidInput(format!("URL缺少主机名：{}", url)));
        }
        Ok(parsed)
    }

    /// 核心检测接口
    /// 仅当URL非法或主请求失败时返回错误（调用方视为空结果）；探针失败不会向外传播
    pub async fn detect(&self, url: &str) -> WtResult<DetectResult> {
        let start = Instant::now();
        let target_url = Self::parse_target(url)?;

        // 1. 主请求：失败则本次检测结束，不启动任何探针
        let raw = match self.fetcher.fetch(&target_url).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not analyze {}: {}", target_url, e);
                return Err(match e {
                    WebTechError::FetchFailure(_) => e,
                    other => WebTechError::FetchFailure(other.to_string()),
                });
            }
        };
        let fetch = FetchResult::new(raw, self.parser.as_ref());

        // 2. 网络探针扇出
        let target = Arc::new(ProbeTarget::new(target_url.clone(), self.registry.clone())?);
        let mut tasks = JoinSet::new();
        for (index, probe) in self.probes.iter().enumerate() {
            let probe = Arc::clone(probe);
            let target = Arc::clone(&target);
            let budget = self.config.probe_budget;
            tasks.spawn(async move {
                let outcome = match timeout(budget, probe.probe(&target)).await {
                    Ok(result) => result,
                    Err(_) => Err(WebTechError::Timeout(format!("探针 {} 超出总预算", probe.name()))),
                };
                (index, outcome)
            });
        }

        // 3. 探针运行期间执行纯函数匹配
        let mut labels = self.analyze_response(&fetch);

        // 4. 汇合：错误/超时/任务异常一律按失败处理，输出兜底标签
        let mut finished = vec![false; self.probes.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    finished[index] = true;
                    let probe = &self.probes[index];
                    match outcome {
                        Ok(found) => {
                            debug!("[{}] {} label(s)", probe.name(), found.len());
                            labels.extend(found);
                        }
                        Err(e) => {
                            debug!("[{}] probe failed: {}", probe.name(), e);
                            labels.extend(probe.fallback());
                        }
                    }
                }
                Err(e) => warn!("Probe task aborted: {}", e),
            }
        }
        for (index, done) in finished.iter().enumerate() {
            if !done {
                labels.extend(self.probes[index].fallback());
            }
        }

        info!(
            "Detection finished | url: {} | status: {} | labels: {} | time: {}ms",
            target_url,
            fetch.status(),
            labels.len(),
            start.elapsed().as_millis()
        );

        Ok(DetectResult {
            url: target_url.to_string(),
            final_url: fetch.url().to_string(),
            status: fetch.status(),
            labels,
        })
    }

    /// 只对已获取的响应做匹配（通道匹配器 + 响应启发式），不发起网络请求
    pub fn analyze_response(&self, fetch: &FetchResult) -> LabelSet {
        let mut labels = run_channel_matchers(&self.registry, fetch);
        labels.extend(run_response_analyzers(fetch));
        labels
    }

    /// 检测并返回纯字符串标签（便于输出）
    pub async fn detect_labels(&self, url: &str) -> WtResult<Vec<String>> {
        let result = self.detect(url).await?;
        Ok(result.labels.into_iter().map(Label::into_string).collect())
    }
}
