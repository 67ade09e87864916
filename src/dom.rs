//! Element helpers over the parsed page
//!
//! Thin wrappers around `scraper` that give the engine DOM-like access:
//! parent and children, sibling positions, class tokens, text content and
//! selector queries that report parse failures instead of panicking.

use scraper::{ElementRef, Html, Selector};

/// Lower-case tag name.
pub fn tag_name<'a>(element: &ElementRef<'a>) -> &'a str {
    element.value().name()
}

/// True for `<html>` and `<body>`, which are never highlighted or selected.
pub fn is_page_root(element: &ElementRef<'_>) -> bool {
    matches!(tag_name(element), "html" | "body")
}

/// Parent element, if the parent node is an element.
pub fn parent_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Element children, skipping text and comment nodes.
pub fn child_elements<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Ancestor elements, closest first.
pub fn ancestor_elements<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.ancestors().filter_map(ElementRef::wrap)
}

/// Class tokens in document order.
pub fn class_tokens<'a>(element: &ElementRef<'a>) -> Vec<&'a str> {
    element.value().classes().collect()
}

/// Non-blank attribute value.
pub fn attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).filter(|v| !v.trim().is_empty())
}

/// Concatenated descendant text, trimmed.
pub fn text_content(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Same element in the same tree.
pub fn same_element(a: &ElementRef<'_>, b: &ElementRef<'_>) -> bool {
    a.id() == b.id()
}

/// True if `element` is `ancestor` or lies inside it.
pub fn contains(ancestor: &ElementRef<'_>, element: &ElementRef<'_>) -> bool {
    same_element(ancestor, element) || element.ancestors().any(|node| node.id() == ancestor.id())
}

/// Position among the parent's element children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingPosition {
    /// Zero-based index.
    pub index: usize,
    /// Number of element children of the parent.
    pub count: usize,
}

/// Position among all element siblings, or `None` without a parent element.
pub fn sibling_position(element: &ElementRef<'_>) -> Option<SiblingPosition> {
    let parent = parent_element(element)?;
    let mut index = None;
    let mut count = 0;
    for child in child_elements(&parent) {
        if same_element(&child, element) {
            index = Some(count);
        }
        count += 1;
    }
    Some(SiblingPosition { index: index?, count })
}

/// Position among siblings sharing the tag name (for `:nth-of-type`).
pub fn same_tag_position(element: &ElementRef<'_>) -> Option<SiblingPosition> {
    let parent = parent_element(element)?;
    let tag = tag_name(element);
    let mut index = None;
    let mut count = 0;
    for child in child_elements(&parent).filter(|c| tag_name(c) == tag) {
        if same_element(&child, element) {
            index = Some(count);
        }
        count += 1;
    }
    Some(SiblingPosition { index: index?, count })
}

/// Parse a selector, keeping the parser's message on failure.
pub fn parse_selector(selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|e| format!("invalid selector {:?}: {}", selector, e))
}

/// First descendant of `scope` matching `selector` (the scope itself excluded).
pub fn query_first<'a>(
    scope: &ElementRef<'a>,
    selector: &str,
) -> Result<Option<ElementRef<'a>>, String> {
    let sel = parse_selector(selector)?;
    Ok(scope.select(&sel).next())
}

/// All descendants of `scope` matching `selector`, in document order.
pub fn query_all<'a>(
    scope: &ElementRef<'a>,
    selector: &str,
) -> Result<Vec<ElementRef<'a>>, String> {
    let sel = parse_selector(selector)?;
    Ok(scope.select(&sel).collect())
}

/// First element of the document matching `selector`.
pub fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(selector).ok()?;
    document.select(&sel).next()
}

/// The `<body>` element, which the HTML parser always creates.
pub fn body(document: &Html) -> Option<ElementRef<'_>> {
    select_first(document, "body")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"
    <html>
    <body>
        <ul id="list">
            <li class="row first">One</li>
            text between
            <li class="row">Two <b>bold</b></li>
            <p>Note</p>
            <li class="row">Three</li>
        </ul>
    </body>
    </html>
    "#;

    #[test]
    fn test_sibling_positions() {
        let document = Html::parse_document(HTML);
        let items: Vec<_> = document.select(&Selector::parse("li").unwrap()).collect();
        let note = select_first(&document, "p").unwrap();

        assert_eq!(sibling_position(&items[2]), Some(SiblingPosition { index: 3, count: 4 }));
        assert_eq!(same_tag_position(&items[2]), Some(SiblingPosition { index: 2, count: 3 }));
        assert_eq!(same_tag_position(&note), Some(SiblingPosition { index: 0, count: 1 }));
        assert_eq!(sibling_position(&document.root_element()), None);
    }

    #[test]
    fn test_text_and_classes() {
        let document = Html::parse_document(HTML);
        let second = select_first(&document, "li:nth-of-type(2)").unwrap();

        assert_eq!(text_content(&second), "Two bold");
        assert_eq!(class_tokens(&second), vec!["row"]);
        assert_eq!(tag_name(&second), "li");
    }

    #[test]
    fn test_scoped_queries() {
        let document = Html::parse_document(HTML);
        let list = select_first(&document, "#list").unwrap();

        assert_eq!(query_all(&list, "li.row").unwrap().len(), 3);
        assert!(query_first(&list, "ul").unwrap().is_none());
        assert!(query_first(&list, "li[").is_err());

        let bold = query_first(&list, "b").unwrap().unwrap();
        assert!(contains(&list, &bold));
        assert!(!contains(&bold, &list));
        assert!(is_page_root(&body(&document).unwrap()));
    }
}
