//! Value extraction
//!
//! Maps a clicked element to the display value of a field kind. Extraction
//! never fails: when nothing plausible is found the value is `""`, which
//! callers read as "field not set".

mod image;
mod price;

pub use image::{extract_image, IMAGE_SOURCE_ATTRS};
pub use price::{PricePattern, PricePatterns};

use scraper::ElementRef;
use url::Url;

use crate::dom::{attr, text_content};
use crate::model::FieldKind;

/// Per-page value extractor: resolves image URLs against the page URL and
/// applies the configured price patterns.
#[derive(Debug, Clone, Default)]
pub struct ValueExtractor {
    base_url: Option<Url>,
    prices: PricePatterns,
}

impl ValueExtractor {
    pub fn new(base_url: Option<Url>, prices: PricePatterns) -> Self {
        Self { base_url, prices }
    }

    /// Extractor for a page URL; an unparsable URL disables image resolution.
    pub fn for_page(page_url: &str) -> Self {
        Self::new(Url::parse(page_url).ok(), PricePatterns::default())
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn prices(&self) -> &PricePatterns {
        &self.prices
    }

    /// Best-guess value of `kind` for `element`.
    pub fn extract(&self, element: &ElementRef<'_>, kind: FieldKind) -> String {
        match kind {
            FieldKind::Image => extract_image(element, self.base_url.as_ref()),
            FieldKind::Title => extract_title(element),
            FieldKind::Description => extract_description(element),
            FieldKind::Price => self.prices.extract(&element.text().collect::<String>()),
            FieldKind::Generic => extract_generic(element),
        }
    }
}

/// [`ValueExtractor::extract`] with no page URL and the default price patterns.
pub fn extract_value(element: &ElementRef<'_>, kind: FieldKind) -> String {
    ValueExtractor::default().extract(element, kind)
}

/// title attribute, alt attribute, text, aria-label.
fn extract_title(element: &ElementRef<'_>) -> String {
    first_non_empty(
        element,
        &[
            Source::Attr("title"),
            Source::Attr("alt"),
            Source::Text,
            Source::Attr("aria-label"),
        ],
    )
}

/// text, data-description, aria-description.
fn extract_description(element: &ElementRef<'_>) -> String {
    first_non_empty(
        element,
        &[Source::Text, Source::Attr("data-description"), Source::Attr("aria-description")],
    )
}

/// text, then the form control value.
fn extract_generic(element: &ElementRef<'_>) -> String {
    first_non_empty(element, &[Source::Text, Source::Attr("value")])
}

enum Source {
    Attr(&'static str),
    Text,
}

fn first_non_empty(element: &ElementRef<'_>, sources: &[Source]) -> String {
    sources
        .iter()
        .find_map(|source| match source {
            Source::Attr(name) => attr(element, name).map(|v| v.trim().to_string()),
            Source::Text => Some(text_content(element)).filter(|t| !t.is_empty()),
        })
        .unwrap_or_default()
}
