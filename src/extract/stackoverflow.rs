//! Stack Overflow question extractor
//!
//! Content is the question body followed by the top answers in page order.

use crate::extract::common::{collect_links, element_text, meta_description, page_title, selector};
use crate::extract::{ExtractError, ExtractedPage, SourceKind};
use scraper::Html;
use std::collections::BTreeMap;
use url::Url;

const MAX_LINKS: usize = 20;
const MAX_ANSWERS: usize = 3;

pub(crate) fn matches(host: &str) -> bool {
    host == "stackoverflow.com" || host.ends_with(".stackoverflow.com")
}

pub(crate) fn extract(url: &Url, document: &Html) -> Result<ExtractedPage, ExtractError> {
    let question_selector = selector("#question .s-prose, div.question .s-prose, div.s-prose")?;
    let question = document
        .select(&question_selector)
        .next()
        .map(|q| element_text(q, None))
        .filter(|q| !q.is_empty())
        .ok_or(ExtractError::MissingElement("div.s-prose"))?;

    let answer_selector = selector("div.answer")?;
    let prose = selector(".s-prose")?;
    let answers: Vec<_> = document.select(&answer_selector).collect();
    let answer_texts: Vec<String> = answers
        .iter()
        .filter_map(|answer| answer.select(&prose).next())
        .map(|body| element_text(body, None))
        .filter(|text| !text.is_empty())
        .take(MAX_ANSWERS)
        .collect();

    let mut sections = vec![question];
    sections.extend(answer_texts);

    let title = page_title(document, "h1[itemprop=name], h1").unwrap_or_default();

    let mut metadata = BTreeMap::new();
    if let Some(description) = meta_description(document) {
        metadata.insert("meta_description".to_string(), description);
    }
    let tag = selector("a.post-tag")?;
    let mut tags: Vec<String> = Vec::new();
    for text in document.select(&tag).map(|a| element_text(a, None)) {
        if !text.is_empty() && !tags.contains(&text) {
            tags.push(text);
        }
    }
    if !tags.is_empty() {
        metadata.insert("tags".to_string(), tags.join(", "));
    }
    metadata.insert("answer_count".to_string(), answers.len().to_string());

    let sidebar_anchor = selector("#sidebar a[href]")?;
    let links = collect_links(document.select(&sidebar_anchor), url, MAX_LINKS, |link| {
        link.path().contains("/questions/")
    });

    let host = url.host_str().unwrap_or_default();
    let language = if host.starts_with("ru.") { "ru" } else { "en" };

    Ok(ExtractedPage {
        source: SourceKind::StackOverflow,
        title,
        content: sections.join("\n\n"),
        metadata,
        links,
        language: Some(language.to_string()),
    })
}
