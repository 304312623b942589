//! 通道匹配器：将一次主请求结果与签名库逐通道比对
//! 每个匹配器都是纯函数，无副作用、无失败路径，未命中不是错误

use reqwest::header::HeaderMap;
use tracing::debug;

use crate::fetcher::FetchResult;
use crate::rule::{Label, LabelSet, Registry, TechnologySignature};
use crate::utils::HeaderConverter;

/// 所有通道匹配器的通用抽象
/// 输入只准备一次，随后对签名库做线性扫描
pub trait ChannelMatcher {
    /// 通道名称，用于日志输出
    const CHANNEL: &'static str;

    /// 本通道从主请求结果中取出的数据
    type Input<'a>;

    fn prepare(fetch: &FetchResult) -> Self::Input<'_>;

    /// 单个签名在本通道是否命中
    fn match_signature(sig: &TechnologySignature, input: &Self::Input<'_>) -> bool;

    /// 通用执行骨架
    fn analyze(registry: &Registry, fetch: &FetchResult) -> LabelSet {
        let input = Self::prepare(fetch);
        let mut labels = LabelSet::new();
        for sig in registry {
            if Self::match_signature(sig, &input) {
                debug!("[{}] matched | tech: {}", Self::CHANNEL, sig.name);
                labels.insert(Label::new(sig.name.as_str()));
            }
        }
        labels
    }
}

/// 任一指示器（小写后）是否出现在任一候选值中
fn any_indicator_in(indicators: &[String], haystacks: &[String]) -> bool {
    indicators
        .iter()
        .filter(|ind| !ind.is_empty())
        .any(|ind| {
            let ind = ind.to_lowercase();
            haystacks.iter().any(|h| h.contains(&ind))
        })
}

/// 响应体子串匹配器
pub struct BodyMatcher;

impl ChannelMatcher for BodyMatcher {
    const CHANNEL: &'static str = "Body";
    type Input<'a> = &'a str;

    fn prepare(fetch: &FetchResult) -> Self::Input<'_> {
        fetch.body_lower()
    }

    fn match_signature(sig: &TechnologySignature, body_lower: &&str) -> bool {
        sig.html
            .iter()
            .filter(|ind| !ind.is_empty())
            .any(|ind| body_lower.contains(&ind.to_lowercase()))
    }
}

/// `<meta name="generator">` 匹配器
pub struct MetaGeneratorMatcher;

impl ChannelMatcher for MetaGeneratorMatcher {
    const CHANNEL: &'static str = "Meta";
    type Input<'a> = Vec<String>;

    fn prepare(fetch: &FetchResult) -> Self::Input<'_> {
        fetch
            .document()
            .meta_contents("generator")
            .map(str::to_lowercase)
            .collect()
    }

    fn match_signature(sig: &TechnologySignature, generators: &Vec<String>) -> bool {
        let Some(expected) = sig.meta_generator.as_deref().filter(|g| !g.is_empty()) else {
            return false;
        };
        let expected = expected.to_lowercase();
        generators.iter().any(|content| content.contains(&expected))
    }
}

/// `<script src>` 匹配器
pub struct ScriptMatcher;

impl ChannelMatcher for ScriptMatcher {
    const CHANNEL: &'static str = "Script";
    type Input<'a> = Vec<String>;

    fn prepare(fetch: &FetchResult) -> Self::Input<'_> {
        fetch.document().script_srcs().map(str::to_lowercase).collect()
    }

    fn match_signature(sig: &TechnologySignature, srcs: &Vec<String>) -> bool {
        any_indicator_in(&sig.scripts, srcs)
    }
}

/// `<link rel="stylesheet" href>` 匹配器
pub struct StylesheetMatcher;

impl ChannelMatcher for StylesheetMatcher {
    const CHANNEL: &'static str = "Stylesheet";
    type Input<'a> = Vec<String>;

    fn prepare(fetch: &FetchResult) -> Self::Input<'_> {
        fetch
            .document()
            .stylesheet_hrefs()
            .map(str::to_lowercase)
            .collect()
    }

    fn match_signature(sig: &TechnologySignature, hrefs: &Vec<String>) -> bool {
        any_indicator_in(&sig.styles, hrefs)
    }
}

/// 响应Header匹配器：签名的所有 (Header, 期望子串) 都满足才命中
pub struct HeaderMatcher;

impl ChannelMatcher for HeaderMatcher {
    const CHANNEL: &'static str = "Header";
    type Input<'a> = &'a HeaderMap;

    fn prepare(fetch: &FetchResult) -> Self::Input<'_> {
        fetch.headers()
    }

    fn match_signature(sig: &TechnologySignature, headers: &&HeaderMap) -> bool {
        !sig.headers.is_empty()
            && sig
                .headers
                .iter()
                .all(|(name, expected)| HeaderConverter::value_contains(headers, name, expected))
    }
}

/// 依次执行五个通道匹配器并合并结果（通道间为逻辑或）
pub fn run_channel_matchers(registry: &Registry, fetch: &FetchResult) -> LabelSet {
    let mut labels = BodyMatcher::analyze(registry, fetch);
    labels.extend(MetaGeneratorMatcher::analyze(registry, fetch));
    labels.extend(ScriptMatcher::analyze(registry, fetch));
    labels.extend(StylesheetMatcher::analyze(registry, fetch));
    labels.extend(HeaderMatcher::analyze(registry, fetch));
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Html5everParser;
    use crate::fetcher::RawResponse;
    use url::Url;

    fn fetch(headers: &[(&str, &str)], body: &str) -> FetchResult {
        FetchResult::new(
            RawResponse {
                final_url: Url::parse("https://example.com/").unwrap(),
                status: 200,
                headers: HeaderConverter::from_pairs(headers.iter().copied()).unwrap(),
                body: body.to_string(),
            },
            &Html5everParser,
        )
    }

    fn has(labels: &LabelSet, name: &str) -> bool {
        labels.contains(&Label::from(name))
    }

    #[test]
    fn test_body_matcher_any_case() {
        let registry = Registry::builtin();
        for sig in registry.iter().filter(|s| {
            !s.html.is_empty()
                && s.meta_generator.is_none()
                && s.scripts.is_empty()
                && s.styles.is_empty()
                && s.headers.is_empty()
                && s.admin_path.is_none()
        }) {
            let indicator = sig.html[0].to_uppercase();
            let hit = fetch(&[], &format!("<p>{}</p>", indicator));
            assert!(has(&BodyMatcher::analyze(&registry, &hit), &sig.name), "{}", sig.name);
        }

        let miss = fetch(&[], "<p>plain</p>");
        assert!(!has(&BodyMatcher::analyze(&registry, &miss), "Angular"));
        assert!(!has(&BodyMatcher::analyze(&registry, &miss), "Vue.js"));
    }

    #[test]
    fn test_meta_generator_matcher() {
        let registry = Registry::builtin();
        let result = fetch(&[], r#"<meta name="generator" content="Drupal 10 (https://www.drupal.org)">"#);
        let labels = MetaGeneratorMatcher::analyze(&registry, &result);
        assert_eq!(labels.into_iter().collect::<Vec<_>>(), vec![Label::from("Drupal")]);

        let other = fetch(&[], r#"<meta name="description" content="WordPress tips">"#);
        assert!(MetaGeneratorMatcher::analyze(&registry, &other).is_empty());
    }

    #[test]
    fn test_script_and_stylesheet_matchers() {
        let registry = Registry::builtin();
        let result = fetch(
            &[],
            r#"<script src="/static/JQuery.Min.js"></script>
               <link rel="stylesheet" href="/css/bootstrap.min.css">
               <link rel="preload" href="/css/woocommerce.css">"#,
        );
        let scripts = ScriptMatcher::analyze(&registry, &result);
        assert!(has(&scripts, "jQuery"));
        let styles = StylesheetMatcher::analyze(&registry, &result);
        assert!(has(&styles, "Bootstrap"));
        assert!(!has(&styles, "WooCommerce"));
    }

    #[test]
    fn test_header_matcher_substring_case_insensitive() {
        let registry = Registry::new(vec![
            TechnologySignature::new("Cloudflare").header("Server", "cloudflare"),
        ])
        .unwrap();
        let hit = fetch(&[("Server", "Cloudflare-Edge")], "");
        assert!(has(&HeaderMatcher::analyze(&registry, &hit), "Cloudflare"));
        let miss = fetch(&[("Server", "nginx")], "");
        assert!(HeaderMatcher::analyze(&registry, &miss).is_empty());
    }

    #[test]
    fn test_header_matcher_requires_every_pair() {
        let registry = Registry::new(vec![TechnologySignature::new("Varnish on Fastly")
            .header("Via", "varnish")
            .header("X-Served-By", "cache-")])
        .unwrap();
        let partial = fetch(&[("Via", "1.1 varnish")], "");
        assert!(HeaderMatcher::analyze(&registry, &partial).is_empty());
        let full = fetch(&[("Via", "1.1 varnish"), ("X-Served-By", "cache-fra1")], "");
        assert!(has(&HeaderMatcher::analyze(&registry, &full), "Varnish on Fastly"));
    }

    #[test]
    fn test_channels_deduplicate() {
        let registry = Registry::builtin();
        let result = fetch(
            &[],
            r#"<meta name="generator" content="WordPress 6.4"><link href="/wp-content/x.css">"#,
        );
        let labels = run_channel_matchers(&registry, &result);
        assert_eq!(labels.iter().filter(|l| l.as_str() == "WordPress").count(), 1);
    }
}
