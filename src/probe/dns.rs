//! DNS邮件探针：查询域名MX记录，输出优先级最高的邮件交换主机
//! 解析失败（NXDOMAIN/超时/无记录）不输出任何标签

use std::time::Duration;
use async_trait::async_trait;
use tokio::time::timeout;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::system_conf::read_system_conf;
use trust_dns_resolver::TokioAsyncResolver;
use tracing::debug;

use super::{Probe, ProbeTarget};
use crate::config::DetectorConfig;
use crate::error::{WebTechError, WtResult};
use crate::rule::{Label, LabelSet};

#[derive(Debug, Clone)]
pub struct DnsMailProbe {
    timeout: Duration,
}

impl DnsMailProbe {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            timeout: config.dns_timeout,
        }
    }

    /// 每次探测新建解析器，随探测结束释放
    fn resolver(&self) -> TokioAsyncResolver {
        let (config, mut opts) = read_system_conf().unwrap_or_else(|e| {
            debug!("[DNS] system resolver config unavailable ({}), using defaults", e);
            (ResolverConfig::default(), ResolverOpts::default())
        });
        opts.timeout = self.timeout;
        opts.attempts = 1;
        TokioAsyncResolver::tokio(config, opts)
    }
}

/// 去掉FQDN结尾的点
fn display_host(name: &str) -> &str {
    name.trim_end_matches('.')
}

#[async_trait]
impl Probe for DnsMailProbe {
    fn name(&self) -> &'static str {
        "DnsMail"
    }

    async fn probe(&self, target: &ProbeTarget) -> WtResult<LabelSet> {
        if target.host_is_ip() {
            return Err(WebTechError::probe(self.name(), "IP地址没有MX记录"));
        }

        let resolver = self.resolver();
        let lookup = timeout(self.timeout, resolver.mx_lookup(target.host.as_str()))
            .await
            .map_err(|_| WebTechError::Timeout(format!("MX查询 {}", target.host)))??;

        let best = lookup
            .iter()
            .min_by_key(|mx| mx.preference())
            .ok_or_else(|| WebTechError::probe(self.name(), format!("{} 没有MX记录", target.host)))?;

        let exchange = best.exchange().to_utf8();
        let mut labels = LabelSet::new();
        labels.insert(Label::keyed("Email Provider", display_host(&exchange)));
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::BUILTIN_REGISTRY;
    use url::Url;

    #[test]
    fn test_display_host() {
        assert_eq!(display_host("aspmx.l.google.com."), "aspmx.l.google.com");
        assert_eq!(display_host("mx.example.org"), "mx.example.org");
    }

    #[tokio::test]
    async fn test_ip_target_is_probe_failure() {
        let probe = DnsMailProbe::new(&DetectorConfig::default());
        let target =
            ProbeTarget::new(Url::parse("http://192.0.2.1/").unwrap(), BUILTIN_REGISTRY.clone()).unwrap();
        let err = probe.probe(&target).await.unwrap_err();
        assert!(matches!(err, WebTechError::ProbeFailure { probe: "DnsMail", .. }));
        assert!(probe.fallback().is_empty());
    }
}
