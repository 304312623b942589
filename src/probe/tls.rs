//! TLS探针：握手后读取协商的协议版本与证书签发者
//! 任何连接/握手失败都输出 `SSL/TLS: Unable to analyze`

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::crypto::ring::default_provider;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, ProtocolVersion, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::debug;
use x509_parser::parse_x509_certificate;

use super::{Probe, ProbeTarget};
use crate::config::DetectorConfig;
use crate::error::{WebTechError, WtResult};
use crate::rule::{Label, LabelSet};

pub const TLS_UNAVAILABLE: &str = "SSL/TLS: Unable to analyze";

#[derive(Clone)]
pub struct TlsInspector {
    connector: TlsConnector,
    port: u16,
    timeout: Duration,
}

impl TlsInspector {
    pub fn new(config: &DetectorConfig) -> WtResult<Self> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let client_config = ClientConfig::builder_with_provider(Arc::new(default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(|e| WebTechError::TlsError(format!("TLS配置初始化失败：{}", e)))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(client_config)),
            port: config.tls_port,
            timeout: config.tls_timeout,
        })
    }
}

/// 协议版本 -> 展示名称
fn protocol_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        ProtocolVersion::TLSv1_1 => "TLSv1.1".to_string(),
        ProtocolVersion::TLSv1_0 => "TLSv1".to_string(),
        other => format!("{:?}", other),
    }
}

/// 证书签发者：优先 O，缺失时退回 CN
pub fn issuer_name(der: &[u8]) -> Option<String> {
    let (_, cert) = parse_x509_certificate(der).ok()?;
    let issuer = cert.issuer();
    let name = issuer
        .iter_organization()
        .chain(issuer.iter_common_name())
        .find_map(|attr| attr.as_str().ok().map(str::to_string));
    name
}

#[async_trait]
impl Probe for TlsInspector {
    fn name(&self) -> &'static str {
        "TLS"
    }

    async fn probe(&self, target: &ProbeTarget) -> WtResult<LabelSet> {
        let server_name = ServerName::try_from(target.host.clone())
            .map_err(|e| WebTechError::TlsError(format!("无效的服务器名称 {}：{}", target.host, e)))?;

        let stream = timeout(self.timeout, TcpStream::connect((target.host.as_str(), self.port)))
            .await
            .map_err(|_| WebTechError::Timeout(format!("TCP连接 {}:{}", target.host, self.port)))??;

        let tls_stream = timeout(self.timeout, self.connector.connect(server_name, stream))
            .await
            .map_err(|_| WebTechError::Timeout(format!("TLS握手 {}:{}", target.host, self.port)))?
            .map_err(|e| WebTechError::TlsError(e.to_string()))?;

        let (_, conn) = tls_stream.get_ref();
        let version = conn
            .protocol_version()
            .ok_or_else(|| WebTechError::TlsError("未协商出协议版本".to_string()))?;

        let mut labels = LabelSet::new();
        labels.insert(Label::keyed("SSL/TLS", protocol_name(version)));

        match conn
            .peer_certificates()
            .and_then(|certs| certs.first())
            .and_then(|leaf| issuer_name(leaf.as_ref()))
        {
            Some(issuer) => {
                labels.insert(Label::keyed("Certificate Issuer", issuer));
            }
            None => debug!("[TLS] no readable issuer for {}", target.host),
        }

        Ok(labels)
    }

    fn fallback(&self) -> LabelSet {
        LabelSet::from([Label::new(TLS_UNAVAILABLE)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::BUILTIN_REGISTRY;
    use url::Url;

    #[test]
    fn test_protocol_names() {
        assert_eq!(protocol_name(ProtocolVersion::TLSv1_3), "TLSv1.3");
        assert_eq!(protocol_name(ProtocolVersion::TLSv1_2), "TLSv1.2");
    }

    #[test]
    fn test_issuer_of_garbage_is_none() {
        assert_eq!(issuer_name(b"not a certificate"), None);
    }

    #[tokio::test]
    async fn test_connection_refused_is_error_with_fallback() {
        let config = crate::config::ConfigManager::custom()
            .tls_port(1)
            .tls_timeout(Duration::from_millis(500))
            .build();
        let inspector = TlsInspector::new(&config).unwrap();
        let target =
            ProbeTarget::new(Url::parse("https://127.0.0.1/").unwrap(), BUILTIN_REGISTRY.clone()).unwrap();

        assert!(inspector.probe(&target).await.is_err());
        assert_eq!(
            inspector.fallback().into_iter().collect::<Vec<_>>(),
            vec![Label::from(TLS_UNAVAILABLE)]
        );
    }
}
