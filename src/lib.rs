//! rswebtech - 单URL网站技术栈指纹识别工具

// 导出全局错误类型
pub use self::error::{WebTechError, WtResult};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, DetectorConfig};

// 导出规则模块核心接口
pub use self::rule::{
    Label, LabelSet, Registry, RegistryLoader, TechnologySignature, BUILTIN_REGISTRY
};

// 导出提取模块核心接口
pub use self::extractor::{DocumentParser, Element, Html5everParser, HtmlDocument};

// 导出主请求模块核心接口
pub use self::fetcher::{FetchResult, Fetcher, HttpFetcher, RawResponse};

// 导出探针模块核心接口
pub use self::probe::{AdminPathProbe, DnsMailProbe, Probe, ProbeTarget, TlsInspector};

// 导出工具模块核心接口
pub use self::utils::{HeaderConverter, VersionExtractor};

// 导出检测模块核心接口
pub use self::detector::{
    DetectResult,
    TechDetector,
    detect_url,
    init_detector,
    init_detector_with_config,
};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod rule;
pub mod extractor;
pub mod fetcher;
pub mod probe;
pub mod utils;
pub mod detector;
