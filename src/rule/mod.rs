//! 规则模块：签名数据模型、内置签名库与签名文件加载
pub mod model;
pub mod registry;
pub mod loader;

// 导出核心接口
pub use self::model::{Label, LabelSet, TechnologySignature};
pub use self::registry::{Registry, BUILTIN_REGISTRY};
pub use self::loader::RegistryLoader;
