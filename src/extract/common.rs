//! HTML helpers shared by all extractors

use crate::extract::ExtractError;
use crate::url::resolve_url;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text never belongs to article content
const ALWAYS_SKIPPED: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Elements that start a new line in block-aware text collection
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Parses a CSS selector
pub fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{}: {:?}", css, e)))
}

/// Collapses all whitespace runs into single spaces and trims the result
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collects the text of an element, skipping excluded subtrees
///
/// Scripts and styles are always skipped; `excluded` adds more.
pub fn element_text(element: ElementRef, excluded: Option<&Selector>) -> String {
    let mut out = String::new();
    push_text(element, excluded, &mut out);
    collapse_whitespace(&out)
}

fn push_text(element: ElementRef, excluded: Option<&Selector>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if is_skipped(child, excluded) {
                continue;
            }
            out.push(' ');
            push_text(child, excluded, out);
            out.push(' ');
        }
    }
}

/// Collects text split at block-element boundaries
///
/// Every returned line is whitespace-collapsed and non-empty.
pub fn block_lines(element: ElementRef, excluded: Option<&Selector>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    push_lines(element, excluded, &mut current, &mut lines);
    flush_line(&mut current, &mut lines);
    lines
}

fn push_lines(
    element: ElementRef,
    excluded: Option<&Selector>,
    current: &mut String,
    lines: &mut Vec<String>,
) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            current.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if is_skipped(child, excluded) {
                continue;
            }
            let is_block = BLOCK_ELEMENTS.contains(&child.value().name());
            if is_block {
                flush_line(current, lines);
            } else {
                current.push(' ');
            }
            push_lines(child, excluded, current, lines);
            if is_block {
                flush_line(current, lines);
            } else {
                current.push(' ');
            }
        }
    }
}

fn flush_line(current: &mut String, lines: &mut Vec<String>) {
    let line = collapse_whitespace(current);
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

fn is_skipped(element: ElementRef, excluded: Option<&Selector>) -> bool {
    ALWAYS_SKIPPED.contains(&element.value().name())
        || excluded.is_some_and(|sel| sel.matches(&element))
}

/// Returns true if the element sits inside a subtree matched by `excluded`
pub fn has_excluded_ancestor(element: ElementRef, excluded: &Selector) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| excluded.matches(&ancestor))
}

/// Text of the first element matching `css`, if non-empty
pub fn first_text(document: &Html, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    document
        .select(&sel)
        .map(|el| element_text(el, None))
        .find(|text| !text.is_empty())
}

/// Value of `attr` on the first element matching `css`, if non-empty
pub fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    document
        .select(&sel)
        .filter_map(|el| el.value().attr(attr))
        .map(collapse_whitespace)
        .find(|value| !value.is_empty())
}

/// Page title from the first matching heading, falling back to `<title>`
pub fn page_title(document: &Html, heading_css: &str) -> Option<String> {
    first_text(document, heading_css).or_else(|| first_text(document, "title"))
}

/// `<meta name="description">`, falling back to `og:description`
pub fn meta_description(document: &Html) -> Option<String> {
    first_attr(document, r#"meta[name="description"]"#, "content")
        .or_else(|| first_attr(document, r#"meta[property="og:description"]"#, "content"))
}

/// Collects resolved links in first-seen order
///
/// # Arguments
///
/// * `anchors` - Candidate `<a>` elements
/// * `base` - URL the hrefs are resolved against
/// * `cap` - Maximum number of links returned
/// * `keep` - Filter applied to each resolved URL
///
/// # Returns
///
/// Canonical, deduplicated absolute URLs
pub fn collect_links<'a, I, F>(anchors: I, base: &Url, cap: usize, keep: F) -> Vec<String>
where
    I: Iterator<Item = ElementRef<'a>>,
    F: Fn(&Url) -> bool,
{
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in anchors {
        if links.len() >= cap {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(resolved) = resolve_url(Some(base), href) else {
            continue;
        };
        let Ok(parsed) = Url::parse(&resolved) else {
            continue;
        };
        if keep(&parsed) && seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }

    links
}
