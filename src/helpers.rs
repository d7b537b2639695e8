//! Helper functions shared by the pages
//!
//! - Image URL sanitization for covers, avatars and chapter pages
//! - Chapter number extraction for ordering
//! - Search query normalization
//!
//! # Examples
//!
//! ```
//! use reqwest::Url;
//! use rust_manga_reader::helpers::{extract_number, sanitize_image_url};
//!
//! let api = Url::parse("https://manga.example.com/api/").unwrap();
//! assert_eq!(
//!     sanitize_image_url("/uploads/cover.jpg", &api).as_deref(),
//!     Some("https://manga.example.com/uploads/cover.jpg")
//! );
//! assert_eq!(sanitize_image_url("javascript:alert(1)", &api), None);
//! assert_eq!(extract_number("Chapter 12.5").as_deref(), Some("12.5"));
//! ```

use regex::Regex;
use reqwest::Url;
use std::sync::OnceLock;

/// Shown wherever an image URL is missing or unusable
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Turn a backend-supplied image reference into a URL safe to render.
///
/// Never panics. Returns `None` for empty input, non-image data URIs,
/// non-http schemes and anything that does not parse.
pub fn sanitize_image_url(raw: &str, api_base: &Url) -> Option<String> {
    let cleaned = raw.trim().replace('\\', "/");
    if cleaned.is_empty() {
        return None;
    }
    let lower = cleaned.to_ascii_lowercase();

    if lower.starts_with("data:") {
        return lower.starts_with("data:image/").then_some(cleaned);
    }

    if cleaned.starts_with("//") {
        return Url::parse(&format!("https:{}", cleaned))
            .ok()
            .filter(is_http)
            .map(String::from);
    }

    // Anything with a scheme before the first slash must be http(s)
    if let Some(colon) = cleaned.find(':') {
        if !cleaned[..colon].contains('/') {
            return Url::parse(&cleaned).ok().filter(is_http).map(String::from);
        }
    }

    // Relative paths are served from the API host root, e.g. /uploads/...
    let origin = api_base.join("/").ok()?;
    origin
        .join(cleaned.trim_start_matches("./"))
        .ok()
        .filter(is_http)
        .map(String::from)
}

pub fn image_or_placeholder(raw: Option<&str>, api_base: &Url) -> String {
    raw.and_then(|r| sanitize_image_url(r, api_base))
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}

fn number_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)").ok()).as_ref()
}

/// Extract the first number from a chapter label
pub fn extract_number(s: &str) -> Option<String> {
    number_regex()?
        .captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Trim and collapse whitespace in a search query
pub fn normalize_search_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}
