//! 全局检测器单例管理
use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::detector::{DetectResult, TechDetector};
use crate::error::{WebTechError, WtResult};
use crate::config::{ConfigManager, DetectorConfig};

/// 全局检测器实例
static GLOBAL_DETECTOR: Lazy<Arc<OnceCell<TechDetector>>> = Lazy::new(|| {
    Arc::new(OnceCell::new())
});

/// 初始化全局检测器（默认配置）
pub async fn init_detector() -> WtResult<()> {
    init_detector_with_config(ConfigManager::get_default()).await
}

/// 带自定义配置初始化全局检测器；重复初始化时保留首个实例
pub async fn init_detector_with_config(config: DetectorConfig) -> WtResult<()> {
    GLOBAL_DETECTOR
        .get_or_try_init(|| TechDetector::new(config))
        .await?;
    Ok(())
}

/// 获取全局检测器
pub fn get_global_detector() -> WtResult<&'static TechDetector> {
    GLOBAL_DETECTOR.get().ok_or(WebTechError::DetectorNotInitialized)
}

/// 使用全局检测器检测单个URL
pub async fn detect_url(url: &str) -> WtResult<DetectResult> {
    get_global_detector()?.detect(url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    // 全局单例在同一进程内共享，按顺序在一个用例中验证
    #[tokio::test]
    async fn test_global_detector_lifecycle() {
        assert!(matches!(
            detect_url("https://example.com/").await,
            Err(WebTechError::DetectorNotInitialized)
        ));
        assert!(matches!(get_global_detector(), Err(WebTechError::DetectorNotInitialized)));

        init_detector().await.unwrap();
        let first = get_global_detector().unwrap() as *const TechDetector;
        assert_eq!(get_global_detector().unwrap().config().tls_port, 443);

        let other = ConfigManager::custom().tls_port(8443).build();
        init_detector_with_config(other).await.unwrap();
        let second = get_global_detector().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(second.config().tls_port, 443);

        assert!(matches!(
            detect_url("ftp://example.com/").await,
            Err(WebTechError::InvalidInput(_))
        ));
    }
}
