//! Readable-content extraction from raw HTML.
//!
//! Boilerplate elements are detached from the parsed tree first, then title,
//! meta description, main content and top headings are read from what is left.
//! Every extracted string goes through [`clean_text`].

use scraper::{ElementRef, Html, Selector};

use crate::config::ExtractorConfig;
use crate::data_models::ExtractedContent;
use crate::error::ExtractError;

/// Elements that never contribute text.
const NON_CONTENT_TAGS: &str = "script, style, nav, header, footer, aside, iframe";
/// Punctuation kept by [`clean_text`]; everything else that is not a word
/// character or whitespace is dropped.
const KEPT_PUNCTUATION: [char; 9] = ['.', ',', '!', '?', ';', ':', '-', '(', ')'];
const MAX_HEADINGS: usize = 5;
const HEADING_SEPARATOR: &str = " | ";
const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Clone)]
pub struct ContentExtractor {
    config: ExtractorConfig,
    content_selectors: Vec<Selector>,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        let config = ExtractorConfig::default();
        // The built-in selector list always parses.
        let content_selectors = config
            .content_selectors
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .collect();
        Self {
            config,
            content_selectors,
        }
    }
}

impl ContentExtractor {
    /// Compile the configured content selectors once, up front.
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractError> {
        let content_selectors = config
            .content_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<Selector>, ExtractError>>()?;
        Ok(Self {
            config,
            content_selectors,
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract normalised fields from `html`. Never fails: on error every field
    /// is empty and `error` carries the reason.
    pub fn extract(&self, html: &str, url: &str) -> ExtractedContent {
        match self.try_extract(html) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(url, error = %e, "content extraction failed");
                ExtractedContent {
                    error: Some(e.to_string()),
                    ..ExtractedContent::default()
                }
            }
        }
    }

    /// Same as [`ContentExtractor::extract`] for bodies that may not be UTF-8.
    pub fn extract_bytes(&self, body: &[u8], url: &str) -> ExtractedContent {
        self.extract(&String::from_utf8_lossy(body), url)
    }

    fn try_extract(&self, html: &str) -> Result<ExtractedContent, ExtractError> {
        let max_len = self.config.max_content_length;
        let mut document = Html::parse_document(html);

        detach_matching(&mut document, &parse_selector(NON_CONTENT_TAGS)?);
        // Html::select also visits detached nodes, so every lookup starts from
        // the root element and only sees what is still attached.
        let root = document.root_element();

        let title = first_text(root, &parse_selector("title")?)
            .map(|t| clean_text(&t, max_len))
            .unwrap_or_default();

        let description = root
            .select(&parse_selector(r#"meta[name="description"]"#)?)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .map(|c| clean_text(c, max_len))
            .unwrap_or_default();

        let mut content = String::new();
        for selector in &self.content_selectors {
            if let Some(element) = root.select(selector).next() {
                content = clean_text(&element_text(element), max_len);
                if !content.is_empty() {
                    break;
                }
            }
        }
        if content.is_empty() {
            content = first_text(root, &parse_selector("body")?)
                .map(|t| clean_text(&t, max_len))
                .unwrap_or_default();
        }

        let headings = root
            .select(&parse_selector("h1, h2, h3")?)
            .map(|h| clean_text(&element_text(h), max_len))
            .filter(|h| !h.is_empty())
            .take(MAX_HEADINGS)
            .collect::<Vec<String>>()
            .join(HEADING_SEPARATOR);

        let word_count = content.split_whitespace().count();

        Ok(ExtractedContent {
            title,
            description,
            content,
            headings,
            word_count,
            error: None,
        })
    }
}

/// Extract with the default configuration.
pub fn extract_content(html: &str, url: &str) -> ExtractedContent {
    ContentExtractor::default().extract(html, url)
}

/// Collapse whitespace, drop characters outside the allow-list, then cap the
/// result at `max_len` characters (plus a `...` marker when cut).
pub fn clean_text(text: &str, max_len: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<&str>>().join(" ");
    let filtered: String = collapsed.chars().filter(|&c| is_kept_char(c)).collect();

    match filtered.char_indices().nth(max_len) {
        Some((cut, _)) => {
            let mut truncated = filtered[..cut].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => filtered,
    }
}

fn is_kept_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace() || KEPT_PUNCTUATION.contains(&c)
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn detach_matching(document: &mut Html, selector: &Selector) {
    let ids = document
        .root_element()
        .select(selector)
        .map(|el| el.id())
        .collect::<Vec<_>>();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn first_text(root: ElementRef<'_>, selector: &Selector) -> Option<String> {
    root.select(selector).next().map(element_text)
}

// Text nodes are joined with a space so adjacent blocks don't run together.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<&str>>().join(" ")
}

#[test]
fn test_clean_text_collapses_and_filters() {
    assert_eq!(clean_text("  Hello,\n\n   world!  ", 100), "Hello, world!");
    assert_eq!(clean_text("price: $5 @ shop #1", 100), "price: 5  shop 1");
    assert_eq!(clean_text("snake_case (ok); yes?", 100), "snake_case (ok); yes?");
    assert_eq!(clean_text("", 100), "");
}

#[test]
fn test_clean_text_truncates_on_chars() {
    assert_eq!(clean_text("abcdefghij", 4), "abcd...");
    assert_eq!(clean_text("abcd", 4), "abcd");
    assert_eq!(clean_text("ééééé", 2), "éé...");
}
