use dom_smoothie::{Config, Readability};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

// Tried in order when readability comes back empty.
static PARAGRAPH_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article p", "main p", "body p"]
        .iter()
        .map(|s| Selector::parse(s).expect("static selector"))
        .collect()
});

/// Best-effort main text of an article page, with boilerplate removed.
///
/// Runs readability first; if that yields nothing, gathers paragraph text
/// from the most specific content container present. Returns `None` when
/// the page has no readable text at all.
pub fn extract_article(html: &str, url: Option<&str>) -> Option<String> {
    readability_text(html, url)
        .or_else(|| paragraph_text(html))
        .filter(|text| !text.is_empty())
}

fn readability_text(html: &str, url: Option<&str>) -> Option<String> {
    let cfg = Config {
        max_elements_to_parse: 9000,
        ..Default::default()
    };

    let mut readability = match Readability::new(html, url, Some(cfg)) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("readability setup failed: {e}");
            return None;
        }
    };
    match readability.parse() {
        Ok(article) => {
            let text = normalize_whitespace(&article.text_content);
            (!text.is_empty()).then_some(text)
        }
        Err(e) => {
            tracing::debug!("readability found no article: {e}");
            None
        }
    }
}

fn paragraph_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    PARAGRAPH_SELECTORS.iter().find_map(|selector| {
        let parts: Vec<String> = document
            .select(selector)
            .map(spaced_text)
            .filter(|t| !t.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    })
}

/// Text nodes of `element` joined by single spaces, whitespace runs collapsed.
pub(crate) fn spaced_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Full text of `element` with runs of whitespace collapsed and ends trimmed.
pub(crate) fn trimmed_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
