//! 签名库：有序、只读的技术签名集合
//! 构建完成后不可修改，检测期间以 Arc 共享，无需加锁

use std::collections::HashSet;
use std::sync::Arc;
use once_cell::sync::Lazy;

use super::model::TechnologySignature;
use crate::error::{WebTechError, WtResult};

/// 内置签名库（进程级单例，首次访问时构建）
pub static BUILTIN_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::builtin()));

#[derive(Debug, Clone, Default)]
pub struct Registry {
    signatures: Vec<TechnologySignature>,
}

impl Registry {
    /// 从签名列表构建，逐条校验并拒绝重名
    pub fn new(signatures: Vec<TechnologySignature>) -> WtResult<Self> {
        let mut seen = HashSet::with_capacity(signatures.len());
        for sig in &signatures {
            sig.validate()?;
            if !seen.insert(sig.name.as_str()) {
                return Err(WebTechError::InvalidSignature(format!(
                    "重复的签名名称：{}",
                    sig.name
                )));
            }
        }
        Ok(Self { signatures })
    }

    /// 按声明顺序遍历
    pub fn iter(&self) -> std::slice::Iter<'_, TechnologySignature> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TechnologySignature> {
        self.signatures.iter().find(|s| s.name == name)
    }

    /// 带后台路径的签名
    pub fn with_admin_paths(&self) -> impl Iterator<Item = (&str, &str)> {
        self.signatures
            .iter()
            .filter_map(|s| s.admin_path.as_deref().map(|p| (s.name.as_str(), p)))
    }

    /// 内置签名库
    pub fn builtin() -> Self {
        let signatures = vec![
            TechnologySignature::new("WordPress")
                .html(["wp-content", "wp-includes"])
                .meta_generator("WordPress")
                .admin_path("/wp-admin/"),
            TechnologySignature::new("Joomla")
                .html(["/components/com_", "/modules/mod_"])
                .meta_generator("Joomla")
                .admin_path("/administrator/"),
            TechnologySignature::new("Drupal")
                .html(["sites/all", "drupal.js"])
                .meta_generator("Drupal")
                .admin_path("/user/login"),
            TechnologySignature::new("Bootstrap")
                .html([r#"class="container""#, r#"class="row""#])
                .styles(["bootstrap.min.css", "bootstrap.css"]),
            TechnologySignature::new("jQuery").scripts(["jquery.js", "jquery.min.js"]),
            TechnologySignature::new("React")
                .scripts(["react.js", "react.min.js"])
                .html(["data-reactroot", "react-app"]),
            TechnologySignature::new("Angular").html(["ng-app", "ng-controller"]),
            TechnologySignature::new("Vue.js").html(["v-app", "v-bind"]),
            TechnologySignature::new("Magento")
                .html(["Mage.Cookies", "magento"])
                .admin_path("/admin/"),
            TechnologySignature::new("Shopify")
                .html(["Shopify.shop", "/cdn.shopify.com/"])
                .scripts(["shopify.js"]),
            TechnologySignature::new("WooCommerce")
                .html(["woocommerce", "wc-"])
                .styles(["woocommerce.css"]),
            TechnologySignature::new("AWS").header("Server", "AmazonS3"),
            TechnologySignature::new("Azure").header("Server", "Microsoft-IIS"),
            TechnologySignature::new("Cloudflare").header("Server", "cloudflare"),
            TechnologySignature::new("Tailwind CSS").html([r#"class=""#, "lg:", "md:", "sm:"]),
            TechnologySignature::new("Foundation").html([r#"class="row""#, r#"class="column""#]),
        ];
        Self { signatures }
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a TechnologySignature;
    type IntoIter = std::slice::Iter<'a, TechnologySignature>;

    fn into_iter(self) -> Self::IntoIter {
        self.signatures.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let builtin = Registry::builtin();
        let rebuilt = Registry::new(builtin.iter().cloned().collect()).unwrap();
        assert_eq!(rebuilt.len(), 16);
        assert_eq!(BUILTIN_REGISTRY.len(), 16);
    }

    #[test]
    fn test_registry_keeps_declaration_order() {
        let names: Vec<_> = Registry::builtin().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names.first().map(String::as_str), Some("WordPress"));
        assert_eq!(names.last().map(String::as_str), Some("Foundation"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Registry::new(vec![
            TechnologySignature::new("A").html(["a"]),
            TechnologySignature::new("A").html(["b"]),
        ]);
        assert!(matches!(result, Err(WebTechError::InvalidSignature(_))));
    }

    #[test]
    fn test_admin_paths() {
        let registry = Registry::builtin();
        let paths: Vec<_> = registry.with_admin_paths().collect();
        assert_eq!(
            paths,
            vec![
                ("WordPress", "/wp-admin/"),
                ("Joomla", "/administrator/"),
                ("Drupal", "/user/login"),
                ("Magento", "/admin/"),
            ]
        );
    }
}
