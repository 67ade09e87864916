//! Image URL extraction
//!
//! Order: the element's own source attributes when it is an image, then an
//! inline background image, then the first descendant image.

use scraper::{ElementRef, Selector};
use url::Url;

use crate::dom::{attr, tag_name};
use crate::style::{background_image, first_css_url};

/// Source attributes of an image, primary first, then lazy-load fallbacks.
pub const IMAGE_SOURCE_ATTRS: [&str; 5] =
    ["src", "data-src", "data-lazy", "data-lazy-src", "data-original"];

/// Best image URL for `element`, or `""`.
pub fn extract_image(element: &ElementRef<'_>, base: Option<&Url>) -> String {
    if is_image(element) {
        return image_source(element, base).unwrap_or_default();
    }

    if let Some(url) = background_image(element).and_then(|bg| first_css_url(&bg)) {
        return resolve(&url, base);
    }

    let Ok(img) = Selector::parse("img") else {
        return String::new();
    };
    element
        .select(&img)
        .next()
        .and_then(|child| image_source(&child, base))
        .unwrap_or_default()
}

fn is_image(element: &ElementRef<'_>) -> bool {
    tag_name(element) == "img"
}

fn image_source(img: &ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    IMAGE_SOURCE_ATTRS
        .iter()
        .find_map(|name| attr(img, name))
        .map(|raw| resolve(raw.trim(), base))
}

/// Resolve `raw` against the page URL, as `img.src` does. Unresolvable values stay raw.
pub fn resolve(raw: &str, base: Option<&Url>) -> String {
    let Some(base) = base else {
        return raw.to_string();
    };
    // Inline payloads are returned verbatim.
    if raw.starts_with("data:") || raw.starts_with("blob:") {
        return raw.to_string();
    }
    match base.join(raw) {
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    }
}
