//! 签名库加载器
//! 支持内置签名库与本地 JSON 签名文件

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::model::TechnologySignature;
use super::registry::{Registry, BUILTIN_REGISTRY};
use crate::config::DetectorConfig;
use crate::error::{WebTechError, WtResult};

pub struct RegistryLoader;

impl RegistryLoader {
    /// 按配置加载签名库：配置了签名文件则读取文件，否则返回内置签名库
    pub async fn load(config: &DetectorConfig) -> WtResult<Arc<Registry>> {
        match &config.signature_file {
            Some(path) => {
                let registry = Self::from_json_file(path).await?;
                info!(
                    "Loaded custom signature file {} | signature count: {}",
                    path.display(),
                    registry.len()
                );
                Ok(Arc::new(registry))
            }
            None => {
                debug!("Using builtin signature registry");
                Ok(BUILTIN_REGISTRY.clone())
            }
        }
    }

    /// 读取 JSON 签名文件（签名对象数组）
    pub async fn from_json_file(path: &Path) -> WtResult<Registry> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            WebTechError::RegistryLoadError(format!("读取签名文件 {} 失败：{}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// 解析 JSON 签名文本
    pub fn from_json_str(json: &str) -> WtResult<Registry> {
        let signatures: Vec<TechnologySignature> = serde_json::from_str(json)?;
        if signatures.is_empty() {
            return Err(WebTechError::RegistryLoadError("签名文件为空".to_string()));
        }
        Registry::new(signatures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_json_str() {
        let json = r#"[
            {"name": "Ghost", "meta_generator": "Ghost", "admin_path": "/ghost/"},
            {"name": "Varnish", "headers": {"Via": "varnish"}}
        ]"#;
        let registry = RegistryLoader::from_json_str(json).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("Varnish").unwrap().headers["Via"], "varnish");
    }

    #[test]
    fn test_reject_signature_without_indicators() {
        let json = r#"[{"name": "Nothing"}]"#;
        assert!(matches!(
            RegistryLoader::from_json_str(json),
            Err(WebTechError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_reject_empty_and_malformed_files() {
        assert!(matches!(
            RegistryLoader::from_json_str("[]"),
            Err(WebTechError::RegistryLoadError(_))
        ));
        assert!(matches!(
            RegistryLoader::from_json_str("{not json"),
            Err(WebTechError::JsonError(_))
        ));
    }

    #[tokio::test]
    async fn test_default_config_uses_builtin() {
        let registry = RegistryLoader::load(&DetectorConfig::default()).await.unwrap();
        assert!(Arc::ptr_eq(&registry, &BUILTIN_REGISTRY));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = RegistryLoader::from_json_file(Path::new("/nonexistent/signatures.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, WebTechError::RegistryLoadError(_)));
    }
}
