//! Habr article extractor

use crate::extract::common::{
    collect_links, element_text, first_attr, first_text, meta_description, page_title, selector,
};
use crate::extract::{ExtractError, ExtractedPage, SourceKind};
use scraper::Html;
use std::collections::BTreeMap;
use url::Url;

const MAX_LINKS: usize = 30;

pub(crate) fn matches(host: &str) -> bool {
    host == "habr.com" || host.ends_with(".habr.com")
}

pub(crate) fn extract(url: &Url, document: &Html) -> Result<ExtractedPage, ExtractError> {
    let body_selector = selector("div.tm-article-body, article")?;
    let body = document
        .select(&body_selector)
        .next()
        .ok_or(ExtractError::MissingElement("div.tm-article-body"))?;

    let noise = selector(".tm-article-poll, .tm-advertisement, .tm-article-presenter__meta")?;
    let content = element_text(body, Some(&noise));

    let title = page_title(document, "h1.tm-title, h1").unwrap_or_default();

    let mut metadata = BTreeMap::new();
    if let Some(description) = meta_description(document) {
        metadata.insert("meta_description".to_string(), description);
    }

    let tag = selector("a.tm-tags-list__link")?;
    let mut tags: Vec<String> = Vec::new();
    for text in document.select(&tag).map(|a| element_text(a, None)) {
        if !text.is_empty() && !tags.contains(&text) {
            tags.push(text);
        }
    }
    if !tags.is_empty() {
        metadata.insert("tags".to_string(), tags.join(", "));
    }

    if let Some(author) = first_text(document, "a.tm-user-info__username") {
        metadata.insert("author".to_string(), author);
    }
    if let Some(published) = first_attr(document, "time[datetime]", "datetime") {
        metadata.insert("published".to_string(), published);
    }

    let anchor = selector("a[href]")?;
    let links = collect_links(document.select(&anchor), url, MAX_LINKS, |link| {
        let path = link.path();
        path.contains("/articles/") || path.contains("/posts/")
    });

    Ok(ExtractedPage {
        source: SourceKind::Habr,
        title,
        content,
        metadata,
        links,
        language: Some("ru".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<html><head><meta name="description" content="Статья о Rust"></head><body>
        <h1 class="tm-title"><span>Пишем краулер на Rust</span></h1>
        <a class="tm-user-info__username" href="/ru/users/ferris/">ferris</a>
        <time datetime="2024-03-01T10:00:00.000Z">1 марта</time>
        <div class="tm-article-body">
          <p>Сегодня мы напишем вежливый краулер.</p>
          <div class="tm-article-poll">Голосование: нравится?</div>
          <p>Он соблюдает robots.txt.</p>
          <div class="tm-advertisement">Реклама</div>
        </div>
        <a class="tm-tags-list__link" href="/ru/hubs/rust/">Rust</a>
        <a class="tm-tags-list__link" href="/ru/hubs/web/">Web</a>
        <a class="tm-tags-list__link" href="/ru/hubs/rust/">Rust</a>
        <a href="/ru/articles/1001/">Другая статья</a>
        <a href="/ru/posts/55/">Пост</a>
        <a href="/ru/hubs/rust/">Хаб</a>
        <a href="/ru/articles/1001/#comments">Комментарии</a>
        </body></html>"#;

    fn extract_article() -> ExtractedPage {
        let url = Url::parse("https://habr.com/ru/articles/1000/").unwrap();
        extract(&url, &Html::parse_document(ARTICLE)).unwrap()
    }

    #[test]
    fn test_title_content_and_language() {
        let page = extract_article();
        assert_eq!(page.title, "Пишем краулер на Rust");
        assert_eq!(
            page.content,
            "Сегодня мы напишем вежливый краулер. Он соблюдает robots.txt."
        );
        assert_eq!(page.language.as_deref(), Some("ru"));
    }

    #[test]
    fn test_metadata() {
        let page = extract_article();
        assert_eq!(page.metadata["tags"], "Rust, Web");
        assert_eq!(page.metadata["author"], "ferris");
        assert_eq!(page.metadata["published"], "2024-03-01T10:00:00.000Z");
        assert_eq!(page.metadata["meta_description"], "Статья о Rust");
    }

    #[test]
    fn test_links_articles_and_posts_only() {
        let page = extract_article();
        assert_eq!(
            page.links,
            vec![
                "https://habr.com/ru/articles/1001/".to_string(),
                "https://habr.com/ru/posts/55/".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_body_is_an_error() {
        let url = Url::parse("https://habr.com/ru/feed/").unwrap();
        let result = extract(&url, &Html::parse_document("<html><body><div>feed</div></body></html>"));
        assert!(matches!(result, Err(ExtractError::MissingElement(_))));
    }
}
