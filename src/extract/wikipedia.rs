//! Wikipedia article extractor

use crate::extract::common::{
    collect_links, element_text, has_excluded_ancestor, meta_description, page_title, selector,
};
use crate::extract::{ExtractError, ExtractedPage, SourceKind};
use scraper::Html;
use std::collections::BTreeMap;
use url::Url;

const MAX_LINKS: usize = 50;

/// Site suffixes appended to `<title>` by the various language editions
const TITLE_SUFFIXES: &[&str] = &[" — Википедия", " - Википедия", " — Wikipedia", " - Wikipedia"];

/// Boxes around the article body that are not prose
const NON_PROSE: &str = "#toc, .toc, .navbox, .vertical-navbox, .infobox, .metadata, .reflist";

/// Inline noise inside paragraphs
const INLINE_NOISE: &str = "sup.reference, .mw-editsection, .noprint";

pub(crate) fn matches(host: &str) -> bool {
    host == "wikipedia.org" || host.ends_with(".wikipedia.org")
}

pub(crate) fn extract(url: &Url, document: &Html) -> Result<ExtractedPage, ExtractError> {
    let root_selector = selector("div#mw-content-text")?;
    let root = document
        .select(&root_selector)
        .next()
        .ok_or(ExtractError::MissingElement("div#mw-content-text"))?;

    let non_prose = selector(NON_PROSE)?;
    let inline_noise = selector(INLINE_NOISE)?;
    let paragraph = selector("p")?;

    let paragraphs: Vec<String> = root
        .select(&paragraph)
        .filter(|p| !has_excluded_ancestor(*p, &non_prose))
        .map(|p| element_text(p, Some(&inline_noise)))
        .filter(|text| !text.is_empty())
        .collect();

    let title = page_title(document, "h1#firstHeading, h1.firstHeading")
        .map(|t| strip_site_suffix(&t))
        .unwrap_or_default();

    let anchor = selector("a[href]")?;
    let links = collect_links(
        root.select(&anchor)
            .filter(|a| is_article_href(a.value().attr("href").unwrap_or_default())),
        url,
        MAX_LINKS,
        |_| true,
    );

    let mut metadata = BTreeMap::new();
    if let Some(description) = meta_description(document) {
        metadata.insert("meta_description".to_string(), description);
    }
    let category = selector("#mw-normal-catlinks li a")?;
    let categories: Vec<String> = document
        .select(&category)
        .map(|a| element_text(a, None))
        .filter(|c| !c.is_empty())
        .collect();
    if !categories.is_empty() {
        metadata.insert("categories".to_string(), categories.join(", "));
    }

    Ok(ExtractedPage {
        source: SourceKind::Wikipedia,
        title,
        content: paragraphs.join("\n"),
        metadata,
        links,
        language: language_from_host(url.host_str().unwrap_or_default()),
    })
}

/// Article links are `/wiki/<Title>` without a namespace colon
fn is_article_href(href: &str) -> bool {
    href.strip_prefix("/wiki/")
        .is_some_and(|rest| !rest.is_empty() && !rest.contains(':'))
}

fn strip_site_suffix(title: &str) -> String {
    TITLE_SUFFIXES
        .iter()
        .find_map(|suffix| title.strip_suffix(suffix))
        .unwrap_or(title)
        .trim()
        .to_string()
}

/// Language edition from the subdomain, e.g. `ru.m.wikipedia.org` is `ru`
fn language_from_host(host: &str) -> Option<String> {
    let prefix = host.strip_suffix("wikipedia.org")?.trim_end_matches('.');
    let lang = prefix.split('.').next()?;
    if lang.is_empty() || lang == "www" || lang == "m" {
        None
    } else {
        Some(lang.to_string())
    }
}
