//! Selector generation
//!
//! Produces a best-effort selector that re-locates elements playing the same
//! role: `#id`, else `tag.class1.class2.class3`, else an `nth-of-type` path of
//! up to four segments below `<body>`, else the bare tag name.

use scraper::ElementRef;

use crate::config::SelectorConfig;
use crate::dom::{class_tokens, is_page_root, parent_element, same_tag_position, tag_name};

/// Selector for `element` with the default limits.
pub fn generate_selector(element: &ElementRef<'_>) -> String {
    generate_selector_with(element, &SelectorConfig::default())
}

/// Selector for `element`.
pub fn generate_selector_with(element: &ElementRef<'_>, config: &SelectorConfig) -> String {
    if let Some(id) = element.value().id().filter(|id| !id.trim().is_empty()) {
        return format!("#{}", id);
    }

    class_selector(element, config)
        .or_else(|| path_selector(element, config))
        .unwrap_or_else(|| tag_name(element).to_string())
}

/// `tag.a.b.c` from the first stable class tokens.
fn class_selector(element: &ElementRef<'_>, config: &SelectorConfig) -> Option<String> {
    let classes: Vec<String> = class_tokens(element)
        .into_iter()
        .filter(|c| !config.is_transient(c))
        .take(config.max_classes)
        .map(escape_ident)
        .collect();

    if classes.is_empty() {
        None
    } else {
        Some(format!("{}.{}", tag_name(element), classes.join(".")))
    }
}

/// `div:nth-of-type(2) > ul > li:nth-of-type(3)`, most distant ancestor first.
fn path_selector(element: &ElementRef<'_>, config: &SelectorConfig) -> Option<String> {
    let mut segments = Vec::new();
    let mut current = Some(*element);

    while let Some(node) = current {
        if is_page_root(&node) || segments.len() >= config.max_path_depth {
            break;
        }
        let tag = tag_name(&node);
        let segment = match same_tag_position(&node) {
            Some(pos) if pos.count > 1 => format!("{}:nth-of-type({})", tag, pos.index + 1),
            _ => tag.to_string(),
        };
        segments.push(segment);
        current = parent_element(&node);
    }

    if segments.is_empty() {
        return None;
    }
    segments.reverse();
    Some(segments.join(" > "))
}

/// Escape a class token so it survives selector parsing (`md:flex` -> `md\:flex`).
pub fn escape_ident(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for (i, c) in ident.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            if i == 0 && c.is_ascii_digit() {
                out.push_str(&format!("\\{:x} ", c as u32));
            } else {
                out.push(c);
            }
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Last compound selector of `selector`: the part after the final combinator.
///
/// `div:nth-of-type(2) > h3.title` gives `h3.title`. Escapes are honoured, so
/// the space ending a hex escape is not read as a descendant combinator.
pub fn last_compound(selector: &str) -> &str {
    let bytes = selector.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 1;
                let hex_start = i;
                while i < bytes.len() && i - hex_start < 6 && bytes[i].is_ascii_hexdigit() {
                    i += 1;
                }
                if i == hex_start {
                    // Escaped literal character.
                    i += 1;
                } else if i < bytes.len() && bytes[i] == b' ' {
                    i += 1;
                }
                continue;
            }
            b' ' | b'>' | b'+' | b'~' => start = i + 1,
            _ => {}
        }
        i += 1;
    }
    selector[start.min(selector.len())..].trim()
}
