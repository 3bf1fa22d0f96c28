//! Catch-all extractor for arbitrary HTML pages

use crate::extract::common::{block_lines, collect_links, meta_description, page_title};
use crate::extract::{ExtractedPage, SourceKind};
use crate::url::extract_domain;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use url::Url;

const MAX_LINKS: usize = 40;

/// Text fragments of this many characters or fewer are navigation noise
const MIN_FRAGMENT_CHARS: usize = 50;

/// Content containers, most specific first
const CONTAINERS: &[&str] = &[
    "main",
    "article",
    "div.content",
    "div#content",
    "div.post-content",
    "div.entry-content",
    "div.article-content",
    "body",
];

const CHROME: &str = "nav, aside, footer, header";

/// Links to these file types are not pages
const FILE_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".zip", ".gz", ".rar", ".exe",
    ".mp3", ".mp4", ".avi", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".css", ".js",
];

/// Extracts any page; never fails
pub(crate) fn extract(url: &Url, document: &Html) -> ExtractedPage {
    let chrome = Selector::parse(CHROME).ok();

    let container = CONTAINERS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let content = block_lines(container, chrome.as_ref())
        .into_iter()
        .filter(|line| line.chars().count() > MIN_FRAGMENT_CHARS)
        .collect::<Vec<_>>()
        .join("\n");

    let title = page_title(document, "h1").unwrap_or_default();

    let domain = extract_domain(url);
    let links = match Selector::parse("a[href]") {
        Ok(anchor) => collect_links(document.select(&anchor), url, MAX_LINKS, |link| {
            extract_domain(link) == domain && !is_file_link(link)
        }),
        Err(_) => Vec::new(),
    };

    let language = document
        .root_element()
        .value()
        .attr("lang")
        .and_then(|lang| lang.split(['-', '_']).next())
        .map(|lang| lang.trim().to_lowercase())
        .filter(|lang| !lang.is_empty());

    ExtractedPage {
        source: SourceKind::Generic,
        title,
        content,
        metadata: collect_meta(document),
        links,
        language,
    }
}

/// All `<meta name|property=... content=...>` pairs plus `meta_description`
fn collect_meta(document: &Html) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    if let Ok(meta) = Selector::parse("meta[content]") {
        for element in document.select(&meta) {
            let attrs = element.value();
            let Some(key) = attrs.attr("name").or_else(|| attrs.attr("property")) else {
                continue;
            };
            let value = attrs.attr("content").unwrap_or_default().trim();
            if !key.is_empty() && !value.is_empty() {
                metadata
                    .entry(key.trim().to_lowercase())
                    .or_insert_with(|| value.to_string());
            }
        }
    }

    if let Some(description) = meta_description(document) {
        metadata.insert("meta_description".to_string(), description);
    }

    metadata
}

fn is_file_link(url: &Url) -> bool {
    let path = url.path();
    FILE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html lang="en-US"><head>
        <title>Blog post</title>
        <meta name="author" content="Ferris">
        <meta property="og:description" content="About crawling">
        </head><body>
        <header>Site header that is long enough to be counted as real text if not stripped</header>
        <nav><a href="/home">Home</a></nav>
        <main>
          <h1>Polite crawling</h1>
          <p>Short line.</p>
          <p>A polite crawler waits between requests and reads robots.txt before fetching anything.</p>
          <p>It also identifies itself with a descriptive user agent so that site owners can reach out.</p>
          <a href="/next-post">Next</a>
          <a href="/files/paper.pdf">Paper</a>
          <a href="https://elsewhere.org/post">Elsewhere</a>
        </main>
        <footer>Footer text that is also long enough to be mistaken for content by a naive parser</footer>
        </body></html>"#;

    fn extract_page() -> ExtractedPage {
        let url = Url::parse("https://blog.example.com/posts/polite").unwrap();
        extract(&url, &Html::parse_document(PAGE))
    }

    #[test]
    fn test_content_keeps_long_fragments_only() {
        let page = extract_page();
        let lines: Vec<&str> = page.content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("A polite crawler waits"));
        assert!(lines[1].starts_with("It also identifies itself"));
        assert!(!page.content.contains("header"));
        assert!(!page.content.contains("Footer"));
    }

    #[test]
    fn test_title_language_and_meta() {
        let page = extract_page();
        assert_eq!(page.title, "Polite crawling");
        assert_eq!(page.language.as_deref(), Some("en"));
        assert_eq!(page.metadata["author"], "Ferris");
        assert_eq!(page.metadata["meta_description"], "About crawling");
        assert_eq!(page.source, SourceKind::Generic);
    }

    #[test]
    fn test_links_same_domain_without_files() {
        let page = extract_page();
        assert_eq!(
            page.links,
            vec![
                "https://blog.example.com/home".to_string(),
                "https://blog.example.com/next-post".to_string(),
            ]
        );
    }

    #[test]
    fn test_body_fallback_strips_chrome() {
        let html = r#"<html><body>
            <nav>Navigation menu with many many many entries that is definitely long</nav>
            <div><p>This is the only real paragraph of text on this otherwise bare page.</p></div>
            </body></html>"#;
        let url = Url::parse("http://example.com/").unwrap();
        let page = extract(&url, &Html::parse_document(html));
        assert_eq!(
            page.content,
            "This is the only real paragraph of text on this otherwise bare page."
        );
        assert_eq!(page.title, "");
        assert_eq!(page.language, None);
    }

    #[test]
    fn test_empty_document() {
        let url = Url::parse("http://example.com/").unwrap();
        let page = extract(&url, &Html::parse_document(""));
        assert!(page.content.is_empty());
        assert!(page.links.is_empty());
    }
}
