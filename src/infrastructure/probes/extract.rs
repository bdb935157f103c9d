//! Ordered pattern extraction of picture URLs from upstream bodies.
//!
//! Patterns run from the most structured signal to the loosest one and the
//! first usable match wins. Generic CDN patterns come last so they cannot
//! shadow a real profile picture with an unrelated image.

use std::sync::OnceLock;

use regex::Regex;

const OG_IMAGE: &str =
    r#"<meta[^>]+property=["']og:image["'][^>]*content=["']([^"']+)["']"#;
const OG_IMAGE_REVERSED: &str =
    r#"<meta[^>]+content=["']([^"']+)["'][^>]*property=["']og:image["']"#;
const HD_INFO: &str = r#""hd_profile_pic_url_info"\s*:\s*\{[^}]*?"url"\s*:\s*"([^"]+)""#;
const PIC_URL_HD: &str = r#""profile_pic_url_hd"\s*:\s*"([^"]+)""#;
const PIC_URL: &str = r#""profile_pic_url"\s*:\s*"([^"]+)""#;
const IMG_CLASS_FIRST: &str =
    r#"<img[^>]+class=["'][^"']*(?:profile|avatar)[^"']*["'][^>]*src=["']([^"']+)["']"#;
const IMG_SRC_FIRST: &str =
    r#"<img[^>]+src=["']([^"']+)["'][^>]*class=["'][^"']*(?:profile|avatar)[^"']*["']"#;
const CDN_URL: &str =
    r#"(https?:(?:\\?/){2}[^"'\s<>]*?(?:cdninstagram\.com|fbcdn\.net)[^"'\s<>]*)"#;

const PLACEHOLDER_MARKERS: [&str; 3] = [
    "rsrc.php",
    "/static/images/",
    "44884218_345707102882519_2446069589734326272_n",
];

/// A compiled, named extraction pattern. Capture group 1 is the URL.
#[derive(Debug)]
pub struct NamedPattern {
    pub name: &'static str,
    regex: Regex,
}

impl NamedPattern {
    fn compile(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("Invalid regex"),
        }
    }
}

/// Which ordered pattern list to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSet {
    /// First-party profile HTML.
    ProfilePage,
    /// Third-party mirror pages.
    Mirror,
}

impl PatternSet {
    /// Patterns in priority order.
    #[must_use]
    pub fn patterns(self) -> &'static [NamedPattern] {
        static PROFILE: OnceLock<Vec<NamedPattern>> = OnceLock::new();
        static MIRROR: OnceLock<Vec<NamedPattern>> = OnceLock::new();

        match self {
            Self::ProfilePage => PROFILE.get_or_init(|| {
                vec![
                    NamedPattern::compile("og_image", OG_IMAGE),
                    NamedPattern::compile("og_image_reversed", OG_IMAGE_REVERSED),
                    NamedPattern::compile("hd_profile_pic_url_info", HD_INFO),
                    NamedPattern::compile("profile_pic_url_hd", PIC_URL_HD),
                    NamedPattern::compile("profile_pic_url", PIC_URL),
                    NamedPattern::compile("cdn_url", CDN_URL),
                ]
            }),
            Self::Mirror => MIRROR.get_or_init(|| {
                vec![
                    NamedPattern::compile("og_image", OG_IMAGE),
                    NamedPattern::compile("og_image_reversed", OG_IMAGE_REVERSED),
                    NamedPattern::compile("img_profile_class", IMG_CLASS_FIRST),
                    NamedPattern::compile("img_profile_src", IMG_SRC_FIRST),
                    NamedPattern::compile("cdn_url", CDN_URL),
                ]
            }),
        }
    }
}

/// Result of running a pattern set over a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// A usable URL, with the name of the pattern that produced it.
    Found { pattern: &'static str, url: String },
    /// Only generic placeholder images matched.
    PlaceholderOnly,
    /// Nothing matched.
    NoMatch,
}

/// Runs `set` over `body`, skipping placeholders and non-http matches.
#[must_use]
pub fn extract(body: &str, set: PatternSet) -> ExtractOutcome {
    let mut saw_placeholder = false;

    for pattern in set.patterns() {
        for caps in pattern.regex.captures_iter(body) {
            let Some(m) = caps.get(1) else { continue };
            let url = clean_url(m.as_str());
            if !url.starts_with("http://") && !url.starts_with("https://") {
                continue;
            }
            if is_placeholder(&url) {
                saw_placeholder = true;
                continue;
            }
            return ExtractOutcome::Found {
                pattern: pattern.name,
                url,
            };
        }
    }

    if saw_placeholder {
        ExtractOutcome::PlaceholderOnly
    } else {
        ExtractOutcome::NoMatch
    }
}

/// Undoes HTML and JSON escaping found in embedded URLs.
#[must_use]
pub fn clean_url(raw: &str) -> String {
    raw.replace("\\u0026", "&")
        .replace("&amp;", "&")
        .replace("\\/", "/")
        .replace('\\', "")
}

/// Whether `url` is a generic silhouette or static asset rather than a picture.
#[must_use]
pub fn is_placeholder(url: &str) -> bool {
    PLACEHOLDER_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Returns the first non-empty string found at any of `pointers`, cleaned.
#[must_use]
pub fn json_pointer_url(value: &serde_json::Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|pointer| value.pointer(pointer))
        .filter_map(serde_json::Value::as_str)
        .map(clean_url)
        .find(|url| !url.is_empty() && !is_placeholder(url))
}

/// Extracts the numeric account id from a profile page.
#[must_use]
pub fn extract_user_id(html: &str) -> Option<String> {
    static PROFILE_ID: OnceLock<Regex> = OnceLock::new();
    static ID: OnceLock<Regex> = OnceLock::new();

    let profile_id = PROFILE_ID
        .get_or_init(|| Regex::new(r#""profile_id"\s*:\s*"(\d+)""#).expect("Invalid regex"));
    let id = ID.get_or_init(|| Regex::new(r#""id"\s*:\s*"(\d+)""#).expect("Invalid regex"));

    [profile_id, id].into_iter().find_map(|re| {
        re.captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}
