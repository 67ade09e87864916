//! Highlight ledger
//!
//! The parsed page is read-only, so every class and inline style the engine
//! puts on the page is recorded here instead. The host mirrors the ledger into
//! the rendered page; clearing the ledger reverses every engine mutation.

use scraper::ElementRef;
use serde::Serialize;

use crate::dom::{class_tokens, same_element};
use crate::selector::generate_selector;

/// Transient hover highlight.
pub const HOVER_CLASS: &str = "extractor-hover";
/// Element committed by a click.
pub const SELECTED_CLASS: &str = "extractor-selected";
/// Element matched by a find-similar pass.
pub const SIMILAR_CLASS: &str = "extractor-similar";
/// Set on `<body>` while a selection is active.
pub const SELECTING_CLASS: &str = "extractor-selecting";

/// Inline declarations applied with the hover class.
pub const HOVER_STYLES: [(&str, &str); 3] = [
    ("outline", "2px solid #667eea"),
    ("outline-offset", "2px"),
    ("background-color", "rgba(102, 126, 234, 0.1)"),
];

#[derive(Debug, Clone)]
struct Mark<'a> {
    element: ElementRef<'a>,
    classes: Vec<&'static str>,
    styles: Vec<(&'static str, &'static str)>,
}

impl Mark<'_> {
    fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.styles.is_empty()
    }
}

/// Serializable view of one marked element, for the host to mirror.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkSnapshot {
    pub selector: String,
    pub classes: Vec<String>,
    pub styles: Vec<(String, String)>,
}

/// Classes and inline styles added by the engine, per element.
#[derive(Debug, Clone, Default)]
pub struct Highlights<'a> {
    marks: Vec<Mark<'a>>,
}

impl<'a> Highlights<'a> {
    pub fn new() -> Self {
        Self { marks: Vec::new() }
    }

    fn mark_mut(&mut self, element: &ElementRef<'a>) -> &mut Mark<'a> {
        let pos = match self.marks.iter().position(|m| same_element(&m.element, element)) {
            Some(pos) => pos,
            None => {
                self.marks.push(Mark {
                    element: *element,
                    classes: Vec::new(),
                    styles: Vec::new(),
                });
                self.marks.len() - 1
            }
        };
        &mut self.marks[pos]
    }

    fn mark(&self, element: &ElementRef<'a>) -> Option<&Mark<'a>> {
        self.marks.iter().find(|m| same_element(&m.element, element))
    }

    /// Add an engine class. Adding it twice has no further effect.
    pub fn add_class(&mut self, element: &ElementRef<'a>, class: &'static str) {
        let mark = self.mark_mut(element);
        if !mark.classes.contains(&class) {
            mark.classes.push(class);
        }
    }

    /// Remove an engine class; drops the entry once nothing is left on it.
    pub fn remove_class(&mut self, element: &ElementRef<'a>, class: &'static str) {
        if let Some(mark) = self.marks.iter_mut().find(|m| same_element(&m.element, element)) {
            mark.classes.retain(|c| *c != class);
        }
        self.marks.retain(|m| !m.is_empty());
    }

    pub fn has_class(&self, element: &ElementRef<'a>, class: &str) -> bool {
        self.mark(element).is_some_and(|m| m.classes.iter().any(|c| *c == class))
    }

    /// Set an inline declaration, replacing an earlier value of the same property.
    pub fn set_style(
        &mut self,
        element: &ElementRef<'a>,
        property: &'static str,
        value: &'static str,
    ) {
        let mark = self.mark_mut(element);
        match mark.styles.iter_mut().find(|(p, _)| *p == property) {
            Some(entry) => entry.1 = value,
            None => mark.styles.push((property, value)),
        }
    }

    /// Remove every inline declaration the engine set on `element`.
    pub fn clear_styles(&mut self, element: &ElementRef<'a>) {
        if let Some(mark) = self.marks.iter_mut().find(|m| same_element(&m.element, element)) {
            mark.styles.clear();
        }
        self.marks.retain(|m| !m.is_empty());
    }

    /// Hover highlight: class plus outline styles.
    pub fn apply_hover(&mut self, element: &ElementRef<'a>) {
        self.add_class(element, HOVER_CLASS);
        for (property, value) in HOVER_STYLES {
            self.set_style(element, property, value);
        }
    }

    pub fn remove_hover(&mut self, element: &ElementRef<'a>) {
        self.remove_class(element, HOVER_CLASS);
        self.clear_styles(element);
    }

    /// Page classes followed by engine classes, like `classList`.
    pub fn effective_classes(&self, element: &ElementRef<'a>) -> Vec<&'a str> {
        let mut classes = class_tokens(element);
        if let Some(mark) = self.mark(element) {
            for &class in &mark.classes {
                if !classes.contains(&class) {
                    classes.push(class);
                }
            }
        }
        classes
    }

    /// Elements currently carrying any engine class or style.
    pub fn marked_elements(&self) -> Vec<ElementRef<'a>> {
        self.marks.iter().map(|m| m.element).collect()
    }

    /// Elements carrying `class`.
    pub fn elements_with(&self, class: &str) -> Vec<ElementRef<'a>> {
        self.marks
            .iter()
            .filter(|m| m.classes.iter().any(|c| *c == class))
            .map(|m| m.element)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Remove every engine class and inline style from the page.
    pub fn clear(&mut self) {
        self.marks.clear();
    }

    /// Ledger as selectors, classes and styles.
    pub fn snapshot(&self) -> Vec<MarkSnapshot> {
        self.marks
            .iter()
            .map(|m| MarkSnapshot {
                selector: generate_selector(&m.element),
                classes: m.classes.iter().map(|c| c.to_string()).collect(),
                styles: m
                    .styles
                    .iter()
                    .map(|(p, v)| (p.to_string(), v.to_string()))
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::select_first;
    use scraper::Html;

    #[test]
    fn test_classes_are_idempotent() {
        let document = Html::parse_document(r#"<p class="title">x</p>"#);
        let p = select_first(&document, "p").unwrap();
        let mut highlights = Highlights::new();

        highlights.add_class(&p, SELECTED_CLASS);
        highlights.add_class(&p, SELECTED_CLASS);

        assert_eq!(highlights.effective_classes(&p), vec!["title", SELECTED_CLASS]);
        assert_eq!(highlights.marked_elements().len(), 1);
    }

    #[test]
    fn test_hover_round_trip_leaves_nothing() {
        let document = Html::parse_document(r#"<p>x</p>"#);
        let p = select_first(&document, "p").unwrap();
        let mut highlights = Highlights::new();

        highlights.apply_hover(&p);
        highlights.apply_hover(&p);
        let snapshot = highlights.snapshot();
        assert_eq!(snapshot[0].classes, vec![HOVER_CLASS.to_string()]);
        assert_eq!(snapshot[0].styles.len(), 3);

        highlights.remove_hover(&p);
        assert!(highlights.is_empty());
    }

    #[test]
    fn test_remove_hover_keeps_permanent_class() {
        let document = Html::parse_document(r#"<p>x</p>"#);
        let p = select_first(&document, "p").unwrap();
        let mut highlights = Highlights::new();

        highlights.apply_hover(&p);
        highlights.add_class(&p, SELECTED_CLASS);
        highlights.remove_hover(&p);

        assert!(highlights.has_class(&p, SELECTED_CLASS));
        assert!(!highlights.has_class(&p, HOVER_CLASS));
        assert_eq!(highlights.elements_with(SELECTED_CLASS).len(), 1);
    }

    #[test]
    fn test_clear_reverts_everything() {
        let document = Html::parse_document(r#"<p>a</p><p>b</p>"#);
        let p = select_first(&document, "p").unwrap();
        let b = select_first(&document, "p:nth-of-type(2)").unwrap();
        let mut highlights = Highlights::new();

        highlights.add_class(&p, SIMILAR_CLASS);
        highlights.apply_hover(&b);
        highlights.clear();

        assert!(highlights.marked_elements().is_empty());
        assert!(highlights.effective_classes(&p).is_empty());
    }
}
