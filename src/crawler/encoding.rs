//! Character encoding detection for downloaded pages
//!
//! Detection order:
//! 1. `charset` parameter of the Content-Type header
//! 2. Statistical detection, only when the detector is confident
//! 3. `<meta charset>` / `http-equiv` declaration in the first 5000 bytes
//! 4. UTF-8 with replacement characters
//!
//! Decoding never fails; malformed sequences become U+FFFD.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use scraper::{Html, Selector};

/// How far into the body to look for a meta charset declaration
const META_SNIFF_LIMIT: usize = 5000;

/// Decodes a response body into text
///
/// # Arguments
///
/// * `body` - Raw response bytes
/// * `content_type` - Content-Type header value, if any
///
/// # Returns
///
/// The decoded text and the encoding that was actually used (a byte order
/// mark overrides the detected encoding)
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> (String, &'static Encoding) {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| detect_statistically(body))
        .or_else(|| charset_from_meta(body))
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        tracing::debug!("Malformed {} sequences replaced while decoding", used.name());
    }

    (text.into_owned(), used)
}

/// Extracts the encoding named by a `charset=` parameter
pub fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let label = value.trim().trim_matches(|c| c == '"' || c == '\'');
        Encoding::for_label(label.as_bytes())
    })
}

fn detect_statistically(body: &[u8]) -> Option<&'static Encoding> {
    let mut detector = EncodingDetector::new();
    detector.feed(body, true);
    let (encoding, confident) = detector.guess_assess(None, true);
    confident.then_some(encoding)
}

fn charset_from_meta(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_SNIFF_LIMIT)];
    let document = Html::parse_document(&String::from_utf8_lossy(head));

    let charset_selector = Selector::parse("meta[charset]").ok()?;
    let declared = document
        .select(&charset_selector)
        .filter_map(|meta| meta.value().attr("charset"))
        .find_map(|label| Encoding::for_label(label.trim().as_bytes()));
    if declared.is_some() {
        return declared;
    }

    let equiv_selector = Selector::parse("meta[http-equiv][content]").ok()?;
    document
        .select(&equiv_selector)
        .filter(|meta| {
            meta.value()
                .attr("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("content-type"))
        })
        .filter_map(|meta| meta.value().attr("content"))
        .find_map(charset_from_content_type)
}
