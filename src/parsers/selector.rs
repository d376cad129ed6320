//! DOM query primitives shared by every field extractor.
//!
//! "Not found" is an ordinary `None`; the caller decides whether absence
//! is an error for its field.

use crate::error::ExtractionError;
use scraper::{ElementRef, Selector};

/// Compiles a CSS selector
pub fn compile(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// First descendant of `scope` matching `selector`
pub fn select_one<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// All descendants of `scope` matching `selector`, in document order
pub fn select_all<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    scope.select(selector).collect()
}

/// Text content of an element with whitespace runs collapsed and trimmed
pub fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Finds a unique container, then reads the text of one descendant of it.
pub fn nested_lookup(
    root: ElementRef<'_>,
    parent: &Selector,
    child: &Selector,
) -> Option<String> {
    let container = select_one(root, parent)?;
    select_one(container, child).map(text_of)
}

/// Scans `containers` for one holding a `label` element whose `attr`
/// equals `expected`, and reads that container's `value` element.
pub fn attribute_filtered_lookup(
    root: ElementRef<'_>,
    containers: &Selector,
    label: &Selector,
    attr: &str,
    expected: &str,
    value: &Selector,
) -> Option<String> {
    root.select(containers)
        .find(|container| {
            container
                .select(label)
                .any(|el| el.value().attr(attr) == Some(expected))
        })
        .and_then(|container| select_one(container, value))
        .map(text_of)
}

/// Like [`attribute_filtered_lookup`], but the `label` element's text must
/// equal `expected` ignoring case and surrounding whitespace. Inner
/// whitespace is compared as is.
pub fn label_text_filtered_lookup(
    root: ElementRef<'_>,
    containers: &Selector,
    label: &Selector,
    expected: &str,
    value: &Selector,
) -> Option<String> {
    let expected = expected.trim().to_lowercase();
    root.select(containers)
        .find(|container| {
            container
                .select(label)
                .any(|el| el.text().collect::<String>().trim().to_lowercase() == expected)
        })
        .and_then(|container| select_one(container, value))
        .map(text_of)
}
