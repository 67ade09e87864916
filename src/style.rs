//! Inline style resolution
//!
//! The engine reads style from the element's own `style` attribute; this is
//! the part of the computed style a parsed page carries with it.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;

lazy_static! {
    static ref CSS_URL: Regex = Regex::new(r#"url\(\s*["']?([^"')]+)["']?\s*\)"#).unwrap();
}

/// `(property, value)` pairs of the inline style, property names lower-cased.
pub fn inline_declarations(element: &ElementRef<'_>) -> Vec<(String, String)> {
    let Some(style) = element.value().attr("style") else {
        return vec![];
    };

    style
        .split(';')
        .filter_map(|decl| {
            // Split on the first colon only: values may contain "https:".
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();
            if name.is_empty() || value.is_empty() {
                None
            } else {
                Some((name, value.to_string()))
            }
        })
        .collect()
}

/// Value of an inline property; the last declaration wins.
pub fn property(element: &ElementRef<'_>, name: &str) -> Option<String> {
    inline_declarations(element)
        .into_iter()
        .rev()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

/// Background image value, from `background-image` or the `background` shorthand.
pub fn background_image(element: &ElementRef<'_>) -> Option<String> {
    property(element, "background-image")
        .or_else(|| property(element, "background").filter(|v| v.contains("url(")))
        .filter(|v| !v.eq_ignore_ascii_case("none"))
}

/// First URL inside a `url(...)` expression, quoted or not.
pub fn first_css_url(value: &str) -> Option<String> {
    CSS_URL
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|url| !url.is_empty())
}

/// True if `display` is a grid or flex variant (`inline-flex`, `grid` ...).
pub fn is_grid_or_flex(element: &ElementRef<'_>) -> bool {
    property(element, "display")
        .map(|d| {
            let d = d.to_ascii_lowercase();
            d.contains("grid") || d.contains("flex")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::select_first;
    use scraper::Html;

    #[test]
    fn test_css_url_forms() {
        assert_eq!(first_css_url(r#"url("https://x/a.png")"#).unwrap(), "https://x/a.png");
        assert_eq!(first_css_url("url('b.jpg'), url(c.jpg)").unwrap(), "b.jpg");
        assert_eq!(first_css_url("url( /img/d.webp )").unwrap(), "/img/d.webp");
        assert!(first_css_url("linear-gradient(red, blue)").is_none());
    }

    #[test]
    fn test_background_from_shorthand() {
        let html = r#"
            <div style="color: red; background: #fff url(https://cdn.test/h.jpg) no-repeat"></div>
        "#;
        let document = Html::parse_document(html);
        let div = select_first(&document, "div").unwrap();

        let bg = background_image(&div).unwrap();
        assert_eq!(first_css_url(&bg).unwrap(), "https://cdn.test/h.jpg");
    }

    #[test]
    fn test_background_none_is_ignored() {
        let html = r#"<div style="background-image: none"></div>"#;
        let document = Html::parse_document(html);
        let div = select_first(&document, "div").unwrap();
        assert!(background_image(&div).is_none());
    }

    #[test]
    fn test_display_detection() {
        let html = r#"
            <section style="display: inline-flex !important"></section>
            <div style="display:block; DISPLAY: grid"></div>
            <p style="display: block"></p>
        "#;
        let document = Html::parse_document(html);

        assert!(is_grid_or_flex(&select_first(&document, "section").unwrap()));
        assert!(is_grid_or_flex(&select_first(&document, "div").unwrap()));
        assert!(!is_grid_or_flex(&select_first(&document, "p").unwrap()));
    }
}
