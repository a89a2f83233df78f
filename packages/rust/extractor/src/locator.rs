//! Label-driven field location.
//!
//! Fields are found by heading/label text and structural adjacency, not by
//! positional offsets, so minor layout reshuffles keep working. A label
//! that cannot be found yields an empty string — extraction fails closed
//! and record validation decides what is fatal.

use scraper::{ElementRef, Html, Selector};

use jobharvest_shared::text::oneline;

/// How to find one field's text in a parsed document.
#[derive(Debug, Clone, Copy)]
pub enum Locator {
    /// First element matching a CSS selector.
    Css(&'static str),
    /// Inside the section introduced by an `<h2>` matching `heading`:
    /// the sibling following a `<span>` whose text matches `label`.
    HeadingLabeled {
        heading: &'static str,
        label: &'static str,
    },
    /// The sibling following a `<p>` whose text matches `label`, anywhere
    /// under the `root` selector.
    ParagraphLabeled {
        root: &'static str,
        label: &'static str,
    },
}

/// A named field and where to find it.
#[derive(Debug, Clone, Copy)]
pub struct FieldLocator {
    pub field: &'static str,
    pub locator: Locator,
}

impl Locator {
    /// Evaluate against a document; an unlocatable label is an empty string.
    pub fn eval(&self, doc: &Html) -> String {
        match self {
            Self::Css(css) => {
                let selector = sel(css);
                doc.select(&selector)
                    .next()
                    .map(|el| collapsed_text(el))
                    .unwrap_or_default()
            }
            Self::HeadingLabeled { heading, label } => section_with_heading(doc, heading)
                .map(|section| labeled_sibling(section, "span", label))
                .unwrap_or_default(),
            Self::ParagraphLabeled { root, label } => {
                let selector = sel(root);
                doc.select(&selector)
                    .next()
                    .map(|el| labeled_sibling(el, "p", label))
                    .unwrap_or_default()
            }
        }
    }
}

/// Evaluate a whole locator table; one `(field, value)` pair per entry.
pub fn locate_fields(doc: &Html, table: &[FieldLocator]) -> Vec<(&'static str, String)> {
    table
        .iter()
        .map(|entry| (entry.field, entry.locator.eval(doc)))
        .collect()
}

// ---------------------------------------------------------------------------
// Structural helpers
// ---------------------------------------------------------------------------

/// Compile a selector known to be valid at authoring time.
pub fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|_| panic!("invalid selector: {css}"))
}

/// All text under an element, whitespace-collapsed to one line.
pub fn collapsed_text(el: ElementRef<'_>) -> String {
    oneline(&el.text().collect::<String>())
}

/// All text under an element, raw. Whitespace between tags carries the
/// line structure; callers clean it up with `text::multiline`.
pub fn block_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Case-insensitive containment on collapsed element text.
fn text_matches(el: ElementRef<'_>, needle: &str) -> bool {
    collapsed_text(el)
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

/// The block introduced by an `<h2>` matching `heading`: the heading's
/// parent element (a `<section>` on the source site).
pub fn section_with_heading<'a>(doc: &'a Html, heading: &str) -> Option<ElementRef<'a>> {
    let h2 = sel("h2");
    for el in doc.select(&h2) {
        if text_matches(el, heading) {
            return el.parent().and_then(ElementRef::wrap);
        }
    }
    None
}

/// The first element sibling after an element.
pub fn next_element<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Within `root`, the element sibling following the first `label_tag`
/// element whose text matches `label`.
pub fn labeled_sibling_element<'a>(
    root: ElementRef<'a>,
    label_tag: &str,
    label: &str,
) -> Option<ElementRef<'a>> {
    let selector = sel(label_tag);
    root.select(&selector)
        .find(|el| text_matches(*el, label))
        .and_then(next_element)
}

/// Collapsed text of [`labeled_sibling_element`], empty when unlocatable.
fn labeled_sibling(root: ElementRef<'_>, label_tag: &str, label: &str) -> String {
    labeled_sibling_element(root, label_tag, label)
        .map(collapsed_text)
        .unwrap_or_default()
}

/// Texts of all elements matching `css` under `root`, one line each.
pub fn texts_of<'a>(root: ElementRef<'a>, css: &str) -> Vec<String> {
    let selector = sel(css);
    root.select(&selector)
        .map(collapsed_text)
        .filter(|t| !t.is_empty())
        .collect()
}
