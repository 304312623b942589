//! 响应启发式探测：只依赖主请求结果（Header / 文档树 / 响应体）
//! 不发起网络请求，也没有失败路径

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::fetcher::FetchResult;
use crate::rule::{Label, LabelSet};
use crate::utils::{HeaderConverter, VersionExtractor};

/// 基于响应内容的探测器
pub trait ResponseAnalyzer {
    const NAME: &'static str;

    fn analyze(fetch: &FetchResult) -> LabelSet;
}

/// 服务端技术：X-Powered-By / Server
pub struct ServerTechAnalyzer;

impl ResponseAnalyzer for ServerTechAnalyzer {
    const NAME: &'static str = "ServerTech";

    fn analyze(fetch: &FetchResult) -> LabelSet {
        let mut labels = LabelSet::new();

        if let Some(powered_by) = fetch.header_joined("X-Powered-By") {
            if powered_by.contains("PHP") {
                let version = VersionExtractor::after_product(&powered_by, "PHP")
                    .filter(|v| VersionExtractor::looks_like_version(v));
                labels.insert(Label::versioned("PHP", version.as_deref()));
            } else if powered_by.contains("ASP.NET") {
                labels.insert(Label::new("ASP.NET"));
            }
        }

        if let Some(server) = fetch.header("Server") {
            let server = server.to_lowercase();
            if server.contains("nginx") {
                labels.insert(Label::new("Nginx"));
            } else if server.contains("apache") {
                labels.insert(Label::new("Apache"));
            }
        }

        labels
    }
}

/// 安全相关Header -> 标签
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("Content-Security-Policy", "Content Security Policy"),
    ("X-XSS-Protection", "XSS Protection"),
    ("X-Frame-Options", "Clickjacking Protection"),
];

pub struct SecurityHeaderAnalyzer;

impl ResponseAnalyzer for SecurityHeaderAnalyzer {
    const NAME: &'static str = "SecurityHeaders";

    fn analyze(fetch: &FetchResult) -> LabelSet {
        SECURITY_HEADERS
            .iter()
            .filter(|(header, _)| fetch.has_header(header))
            .map(|(_, label)| Label::new(*label))
            .collect()
    }
}

const CDN_HEADERS: &[&str] = &["X-CDN", "X-EdgeConnect-MidMile-RTT", "X-Akamai-Transformed"];

/// CDN Header：任一存在即输出单个标签
pub struct CdnHeaderAnalyzer;

impl ResponseAnalyzer for CdnHeaderAnalyzer {
    const NAME: &'static str = "CdnHeaders";

    fn analyze(fetch: &FetchResult) -> LabelSet {
        let mut labels = LabelSet::new();
        if let Some(header) = CDN_HEADERS.iter().find(|h| HeaderConverter::contains(fetch.headers(), h)) {
            debug!("[{}] CDN header present: {}", Self::NAME, header);
            labels.insert(Label::new("CDN Detected"));
        }
        labels
    }
}

/// 电商平台特征（大小写敏感）
const ECOMMERCE_PLATFORMS: &[(&str, &str)] = &[("Shopify.shop", "Shopify")];

pub struct EcommerceAnalyzer;

impl ResponseAnalyzer for EcommerceAnalyzer {
    const NAME: &'static str = "Ecommerce";

    fn analyze(fetch: &FetchResult) -> LabelSet {
        let mut labels = LabelSet::new();
        let body_lower = fetch.body_lower();
        if body_lower.contains("checkout") || body_lower.contains("cart") {
            labels.insert(Label::new("E-commerce functionality"));
        }
        for (marker, platform) in ECOMMERCE_PLATFORMS {
            if fetch.body().contains(marker) {
                labels.insert(Label::new(*platform));
            }
        }
        labels
    }
}

/// 社交平台：(平台名, 链接域名匹配)
static SOCIAL_PLATFORMS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("Facebook", r"facebook\.com"),
        ("Twitter", r"twitter\.com"),
        ("Instagram", r"instagram\.com"),
        ("Linkedin", r"linkedin\.com"),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
    .collect()
});

const SOCIAL_META_PROPERTIES: &[&str] = &["og:title", "twitter:card"];

pub struct SocialAnalyzer;

impl ResponseAnalyzer for SocialAnalyzer {
    const NAME: &'static str = "Social";

    fn analyze(fetch: &FetchResult) -> LabelSet {
        let document = fetch.document();
        let mut labels: LabelSet = SOCIAL_PLATFORMS
            .iter()
            .filter(|(_, re)| document.find_by_attr_regex("a", "href", re).is_some())
            .map(|(platform, _)| Label::new(format!("{} integration", platform)))
            .collect();

        if SOCIAL_META_PROPERTIES
            .iter()
            .any(|p| document.find_by_attr_value("meta", "property", p).is_some())
        {
            labels.insert(Label::new("Social Media Metadata"));
        }
        labels
    }
}

const MODERN_IMAGE_FORMATS: &[&str] = &["webp", "avif"];

pub struct ImageAnalyzer;

impl ResponseAnalyzer for ImageAnalyzer {
    const NAME: &'static str = "Images";

    fn analyze(fetch: &FetchResult) -> LabelSet {
        let document = fetch.document();
        let mut labels = LabelSet::new();
        if document.find_by_attr_value("img", "loading", "lazy").is_some() {
            labels.insert(Label::new("Lazy Loading Images"));
        }
        for src in document.find_all("img").filter_map(|img| img.attr("src")) {
            let src = src.to_lowercase();
            for format in MODERN_IMAGE_FORMATS {
                if src.ends_with(&format!(".{}", format)) {
                    labels.insert(Label::new(format!("{} Image Format", format.to_uppercase())));
                }
            }
        }
        labels
    }
}

pub struct AccessibilityAnalyzer;

impl ResponseAnalyzer for AccessibilityAnalyzer {
    const NAME: &'static str = "Accessibility";

    fn analyze(fetch: &FetchResult) -> LabelSet {
        let document = fetch.document();
        let mut labels = LabelSet::new();
        if document.find_by_attr_prefix("aria-").is_some() || document.find_by_attr(None, "role").is_some() {
            labels.insert(Label::new("ARIA attributes (Accessibility)"));
        }
        labels
    }
}

pub struct MobileAnalyzer;

impl ResponseAnalyzer for MobileAnalyzer {
    const NAME: &'static str = "Mobile";

    fn analyze(fetch: &FetchResult) -> LabelSet {
        let mut labels = LabelSet::new();
        if fetch.document().find_by_attr_value("meta", "name", "viewport").is_some() {
            labels.insert(Label::new("Responsive Design"));
        }
        labels
    }
}

const PRIVACY_TERMS: &[&str] = &["gdpr", "ccpa", "cookie consent"];

/// 隐私合规：在文档文本中查找关键词
pub struct PrivacyAnalyzer;

impl ResponseAnalyzer for PrivacyAnalyzer {
    const NAME: &'static str = "Privacy";

    fn analyze(fetch: &FetchResult) -> LabelSet {
        let text = fetch.document().text().to_lowercase();
        PRIVACY_TERMS
            .iter()
            .filter(|term| text.contains(*term))
            .map(|term| Label::new(format!("{} Compliance Tool", term.to_uppercase())))
            .collect()
    }
}

const ANALYTICS_VENDORS: &[(&str, &str)] = &[
    ("Google Analytics", "google-analytics.com/analytics.js"),
    ("Google Tag Manager", "googletagmanager.com/gtm.js"),
    ("Hotjar", "static.hotjar.com"),
    ("Mixpanel", "cdn.mxpnl.com"),
];

pub struct AnalyticsAnalyzer;

impl ResponseAnalyzer for AnalyticsAnalyzer {
    const NAME: &'static str = "Analytics";

    fn analyze(fetch: &FetchResult) -> LabelSet {
        ANALYTICS_VENDORS
            .iter()
            .filter(|(_, fragment)| fetch.body().contains(fragment))
            .map(|(vendor, _)| Label::new(*vendor))
            .collect()
    }
}

const FONT_SERVICES: &[(&str, &str)] = &[
    ("fonts.googleapis.com", "Google Fonts"),
    ("use.typekit.net", "Adobe Typekit"),
];

pub struct FontAnalyzer;

impl ResponseAnalyzer for FontAnalyzer {
    const NAME: &'static str = "Fonts";

    fn analyze(fetch: &FetchResult) -> LabelSet {
        let hrefs: Vec<String> = fetch
            .document()
            .stylesheet_hrefs()
            .map(str::to_lowercase)
            .collect();
        FONT_SERVICES
            .iter()
            .filter(|(host, _)| hrefs.iter().any(|href| href.contains(host)))
            .map(|(_, label)| Label::new(*label))
            .collect()
    }
}

/// 依次执行所有响应启发式探测
pub fn run_response_analyzers(fetch: &FetchResult) -> LabelSet {
    fn run<A: ResponseAnalyzer>(fetch: &FetchResult, labels: &mut LabelSet) {
        let found = A::analyze(fetch);
        if !found.is_empty() {
            debug!("[{}] {} label(s)", A::NAME, found.len());
        }
        labels.extend(found);
    }

    let mut labels = LabelSet::new();
    run::<ServerTechAnalyzer>(fetch, &mut labels);
    run::<SecurityHeaderAnalyzer>(fetch, &mut labels);
    run::<CdnHeaderAnalyzer>(fetch, &mut labels);
    run::<EcommerceAnalyzer>(fetch, &mut labels);
    run::<SocialAnalyzer>(fetch, &mut labels);
    run::<ImageAnalyzer>(fetch, &mut labels);
    run::<AccessibilityAnalyzer>(fetch, &mut labels);
    run::<MobileAnalyzer>(fetch, &mut labels);
    run::<PrivacyAnalyzer>(fetch, &mut labels);
    run::<AnalyticsAnalyzer>(fetch, &mut labels);
    run::<FontAnalyzer>(fetch, &mut labels);
    labels
}
