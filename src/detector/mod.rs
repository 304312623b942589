//! 检测模块：通道匹配、响应启发式与检测器聚合逻辑
pub mod analyzer;
pub mod heuristics;
pub mod detector;
pub mod global;

// 导出核心接口
pub use self::analyzer::{
    run_channel_matchers, BodyMatcher, ChannelMatcher, HeaderMatcher, MetaGeneratorMatcher,
    ScriptMatcher, StylesheetMatcher,
};
pub use self::heuristics::{run_response_analyzers, ResponseAnalyzer};
pub use self::detector::{DetectResult, TechDetector};
pub use self::global::{detect_url, get_global_detector, init_detector, init_detector_with_config};
