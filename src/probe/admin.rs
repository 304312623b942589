//! 后台路径探针
//! 对签名库中声明了后台路径的技术逐个发起短超时GET，HTTP 200 即视为证据
//! 注意：对任意路径都返回 200 的站点会产生误报

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use tokio::task::JoinSet;
use tracing::debug;

use super::{Probe, ProbeTarget};
use crate::config::DetectorConfig;
use crate::error::WtResult;
use crate::rule::{Label, LabelSet};

#[derive(Debug, Clone)]
pub struct AdminPathProbe {
    client: Client,
    user_agent: String,
}

impl AdminPathProbe {
    pub fn new(config: &DetectorConfig) -> WtResult<Self> {
        let client = Client::builder()
            .timeout(config.admin_timeout)
            .connect_timeout(config.admin_timeout)
            .build()?;
        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait]
impl Probe for AdminPathProbe {
    fn name(&self) -> &'static str {
        "AdminPath"
    }

    async fn probe(&self, target: &ProbeTarget) -> WtResult<LabelSet> {
        let mut requests = JoinSet::new();
        for (name, path) in target.registry.with_admin_paths() {
            let client = self.client.clone();
            let user_agent = self.user_agent.clone();
            let admin_url = format!("{}{}", target.origin, path);
            let name = name.to_string();
            requests.spawn(async move {
                match client.get(&admin_url).header(USER_AGENT, user_agent).send().await {
                    Ok(resp) if resp.status() == StatusCode::OK => Some(name),
                    Ok(resp) => {
                        debug!("[AdminPath] {} -> {}", admin_url, resp.status());
                        None
                    }
                    Err(e) => {
                        debug!("[AdminPath] {} failed: {}", admin_url, e);
                        None
                    }
                }
            });
        }

        let mut labels = LabelSet::new();
        while let Some(joined) = requests.join_next().await {
            if let Ok(Some(name)) = joined {
                labels.insert(Label::new(format!("{} (Admin page found)", name)));
            }
        }
        Ok(labels)
    }
}
