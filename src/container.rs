//! Container inference
//!
//! Finds the repeated "card" around an exemplar element and the set of
//! sibling cards it belongs to. Two heuristics run in order: class markers
//! with a sibling repetition check, then a layout container (grid, flex,
//! row). If both fail the exemplar is its own container.

use scraper::ElementRef;
use tracing::debug;

use crate::config::ContainerConfig;
use crate::dom::{
    ancestor_elements, child_elements, class_tokens, contains, is_page_root, parent_element,
    query_all, tag_name,
};
use crate::selector::escape_ident;
use crate::style::is_grid_or_flex;

/// Which heuristic produced a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStrategy {
    /// Ancestor with a card/item/product/menu/column class repeated among its siblings.
    ClassMarker,
    /// Grid, flex or row container; its children are the cards.
    Layout,
    /// Nothing repeated: the exemplar alone.
    Exemplar,
}

/// Repeated container around an exemplar, with its sibling set.
#[derive(Debug, Clone)]
pub struct ContainerCandidate<'a> {
    /// The container holding the exemplar.
    pub root: ElementRef<'a>,
    /// All containers of the group in document order, `root` included.
    pub siblings: Vec<ElementRef<'a>>,
    /// Class token that marked the card, for the class-marker heuristic.
    pub matched_class_token: Option<String>,
    /// Selector matching the sibling set.
    pub selector: String,
    pub strategy: ContainerStrategy,
}

/// Locate the repeated container of `exemplar`.
pub fn find_container<'a>(
    exemplar: &ElementRef<'a>,
    config: &ContainerConfig,
) -> ContainerCandidate<'a> {
    if let Some(candidate) = find_marked_card(exemplar, config) {
        debug!(
            selector = %candidate.selector,
            siblings = candidate.siblings.len(),
            "container found by class marker"
        );
        return candidate;
    }

    if let Some(candidate) = find_layout_container(exemplar, config) {
        debug!(
            selector = %candidate.selector,
            siblings = candidate.siblings.len(),
            "container found by layout"
        );
        return candidate;
    }

    debug!(tag = tag_name(exemplar), "no repeated container, using exemplar");
    ContainerCandidate {
        root: *exemplar,
        siblings: vec![*exemplar],
        matched_class_token: None,
        selector: tag_name(exemplar).to_string(),
        strategy: ContainerStrategy::Exemplar,
    }
}

fn card_marker<'c>(classes: &[&'c str], config: &ContainerConfig) -> Option<&'c str> {
    classes.iter().copied().find(|class| {
        config.card_markers.iter().any(|m| class.contains(m.as_str()))
            || class.contains(config.column_marker.as_str())
    })
}

/// Pass 1: closest ancestor (or the exemplar) whose marker class repeats among its siblings.
fn find_marked_card<'a>(
    exemplar: &ElementRef<'a>,
    config: &ContainerConfig,
) -> Option<ContainerCandidate<'a>> {
    let chain = std::iter::once(*exemplar).chain(ancestor_elements(exemplar));

    for candidate in chain.take(config.max_card_depth) {
        if is_page_root(&candidate) {
            break;
        }
        let classes = class_tokens(&candidate);
        let Some(token) = card_marker(&classes, config) else {
            continue;
        };
        let Some(parent) = parent_element(&candidate) else {
            continue;
        };

        let repeats = child_elements(&parent)
            .filter(|child| {
                class_tokens(child).iter().any(|c| {
                    c.contains(config.column_marker.as_str()) || classes.contains(c)
                })
            })
            .count();
        if repeats < config.min_repeated_siblings {
            continue;
        }

        let selector = format!(".{}", escape_ident(token));
        let siblings = match query_all(&parent, &selector) {
            Ok(found) => outermost(found),
            Err(err) => {
                debug!(error = %err, "card selector rejected");
                continue;
            }
        };
        if siblings.is_empty() {
            continue;
        }

        return Some(ContainerCandidate {
            root: candidate,
            siblings,
            matched_class_token: Some(token.to_string()),
            selector,
            strategy: ContainerStrategy::ClassMarker,
        });
    }
    None
}

/// Pass 2: closest ancestor laid out as a grid/flex/row with enough children.
fn find_layout_container<'a>(
    exemplar: &ElementRef<'a>,
    config: &ContainerConfig,
) -> Option<ContainerCandidate<'a>> {
    for layout in ancestor_elements(exemplar).take(config.max_layout_depth) {
        if is_page_root(&layout) {
            break;
        }
        let children: Vec<_> = child_elements(&layout).collect();
        if children.len() < config.min_layout_children {
            continue;
        }
        let classes = class_tokens(&layout);
        let marked = classes
            .iter()
            .any(|c| config.layout_markers.iter().any(|m| c.contains(m.as_str())));
        if !(marked || is_grid_or_flex(&layout)) {
            continue;
        }

        let root = children.iter().copied().find(|child| contains(child, exemplar))?;
        let mut layout_selector = tag_name(&layout).to_string();
        for class in classes {
            layout_selector.push('.');
            layout_selector.push_str(&escape_ident(class));
        }

        return Some(ContainerCandidate {
            root,
            siblings: children,
            matched_class_token: None,
            selector: format!("{} > *", layout_selector),
            strategy: ContainerStrategy::Layout,
        });
    }
    None
}

/// Drop matches nested inside another match.
fn outermost<'a>(found: Vec<ElementRef<'a>>) -> Vec<ElementRef<'a>> {
    found
        .iter()
        .filter(|el| !found.iter().any(|other| other.id() != el.id() && contains(other, el)))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{select_first, text_content};
    use scraper::Html;

    fn texts(elements: &[ElementRef<'_>]) -> Vec<String> {
        elements.iter().map(text_content).collect()
    }

    #[test]
    fn test_product_cards() {
        let html = r#"
        <div class="grid">
            <div class="product-card"><h3 class="title">Widget A</h3></div>
            <div class="product-card"><h3 class="title">Widget B</h3></div>
            <div class="product-card"><h3 class="title">Widget C</h3></div>
        </div>
        "#;
        let document = Html::parse_document(html);
        let title = select_first(&document, "h3").unwrap();
        let container = find_container(&title, &ContainerConfig::default());

        assert_eq!(container.strategy, ContainerStrategy::ClassMarker);
        assert_eq!(container.matched_class_token.as_deref(), Some("product-card"));
        assert_eq!(container.selector, ".product-card");
        assert_eq!(texts(&container.siblings), vec!["Widget A", "Widget B", "Widget C"]);
        assert_eq!(container.root.id(), container.siblings[0].id());
    }

    #[test]
    fn test_single_card_climbs_to_column() {
        let html = r#"
        <div class="row">
            <div class="col-md-4"><div class="card"><span>One</span></div></div>
            <div class="col-md-4"><div class="card"><span>Two</span></div></div>
        </div>
        "#;
        let document = Html::parse_document(html);
        let span = select_first(&document, "span").unwrap();
        let container = find_container(&span, &ContainerConfig::default());

        // .card has no repeated sibling inside its column; the column repeats.
        assert_eq!(container.matched_class_token.as_deref(), Some("col-md-4"));
        assert_eq!(texts(&container.siblings), vec!["One", "Two"]);
    }

    #[test]
    fn test_layout_container_children() {
        let html = r#"
        <ul style="display: flex">
            <li><b>First</b></li>
            <li><b>Second</b></li>
            <li><b>Third</b></li>
        </ul>
        "#;
        let document = Html::parse_document(html);
        let second = select_first(&document, "li:nth-of-type(2) b").unwrap();
        let container = find_container(&second, &ContainerConfig::default());

        assert_eq!(container.strategy, ContainerStrategy::Layout);
        assert_eq!(container.selector, "ul > *");
        assert_eq!(text_content(&container.root), "Second");
        assert_eq!(container.siblings.len(), 3);
    }

    #[test]
    fn test_row_class_is_a_layout() {
        let html = r#"
        <div class="row">
            <div><span>North</span></div>
            <div><span>South</span></div>
            <div><span>East</span></div>
        </div>
        "#;
        let document = Html::parse_document(html);
        let south = select_first(&document, "div:nth-of-type(2) > span").unwrap();
        let container = find_container(&south, &ContainerConfig::default());

        assert_eq!(container.strategy, ContainerStrategy::Layout);
        assert_eq!(container.selector, "div.row > *");
        assert_eq!(text_content(&container.root), "South");
        assert_eq!(texts(&container.siblings), vec!["North", "South", "East"]);
    }

    #[test]
    fn test_layout_needs_three_children() {
        let html = r#"<div class="grid-2"><p><i>a</i></p><p><i>b</i></p></div>"#;
        let document = Html::parse_document(html);
        let italic = select_first(&document, "i").unwrap();
        let container = find_container(&italic, &ContainerConfig::default());

        assert_eq!(container.strategy, ContainerStrategy::Exemplar);
        assert_eq!(container.selector, "i");
        assert_eq!(container.siblings.len(), 1);
    }

    #[test]
    fn test_marker_without_repeats_keeps_climbing() {
        let html = r#"
        <section>
            <div class="menu-item"><span class="menu-item-label">Tea</span></div>
            <div class="menu-item"><span class="menu-item-label">Coffee</span></div>
        </section>
        "#;
        let document = Html::parse_document(html);
        let label = select_first(&document, "span").unwrap();
        let container = find_container(&label, &ContainerConfig::default());

        assert_eq!(container.matched_class_token.as_deref(), Some("menu-item"));
        assert_eq!(texts(&container.siblings), vec!["Tea", "Coffee"]);
    }
}
