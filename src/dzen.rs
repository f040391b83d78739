//! Article extraction for pages rendered from dzen.ru.
//!
//! Dzen serves its article markup client-side, so this works on the rendered
//! HTML snapshot. Headline and body are located by their schema.org
//! `itemprop` first, then by the render container class names.

use std::path::Path;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, info, warn};

use crate::error::{AppError, Result};
use crate::extract::{spaced_text, trimmed_text};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static TITLE_SELECTORS: Lazy<[Selector; 2]> = Lazy::new(|| {
    [
        selector(r#"h1[itemprop="headline"]"#),
        selector("h1.content--article-render__title-1g"),
    ]
});

static BODY_SELECTORS: Lazy<[Selector; 2]> = Lazy::new(|| {
    [
        selector(r#"div[itemprop="articleBody"]"#),
        selector("div.content--article-render__container-1k"),
    ]
});

static BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("h2, p"));
static SPAN_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("span"));

/// Flattens a rendered Dzen article into `title segment segment ...`.
///
/// If no headline is found and `snapshot` is set, the page HTML is written
/// there for offline inspection before the error is returned.
pub fn extract_article(html: &str, snapshot: Option<&Path>) -> Result<String> {
    let document = Html::parse_document(html);

    let Some(title_element) = first_match(&document, &*TITLE_SELECTORS) else {
        error!("article title not found");
        if let Some(path) = snapshot {
            write_snapshot(path, html);
        }
        return Err(AppError::ExtractionError("article title not found".to_string()));
    };
    let title = trimmed_text(title_element);
    info!("title found: {}", preview(&title));

    let Some(body) = first_match(&document, &*BODY_SELECTORS) else {
        error!("article body not found");
        return Err(AppError::ExtractionError("article body not found".to_string()));
    };

    let mut content = vec![title];
    let mut processed = 0usize;
    for element in body.select(&BLOCK_SELECTOR) {
        match block_text(element) {
            Some(text) => {
                debug!("<{}> {}", element.value().name(), preview(&text));
                content.push(text);
                processed += 1;
            }
            None => debug!("skipping empty <{}>", element.value().name()),
        }
    }
    info!("processed {processed} body elements");

    let full_text = content
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    info!("extracted {} chars", full_text.chars().count());
    Ok(full_text)
}

fn first_match<'a>(document: &'a Html, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|selector| document.select(selector).next())
}

fn block_text(element: ElementRef<'_>) -> Option<String> {
    let text = match element.value().name() {
        "h2" => {
            let mut spans = element.select(&SPAN_SELECTOR).peekable();
            if spans.peek().is_none() {
                trimmed_text(element)
            } else {
                spans
                    .map(trimmed_text)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        }
        "p" => spaced_text(element),
        other => {
            warn!("unexpected <{other}> in article body");
            return None;
        }
    };
    (!text.is_empty()).then_some(text)
}

fn write_snapshot(path: &Path, html: &str) {
    match std::fs::write(path, html) {
        Ok(()) => info!("saved page snapshot to {}", path.display()),
        Err(e) => warn!("could not write page snapshot to {}: {e}", path.display()),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<html><head><title>Статья</title></head><body>
        <div class="header">Дзен</div>
        <h1 itemprop="headline">Как приготовить борщ</h1>
        <div itemprop="articleBody">
            <p>Борщ готовят из <b>свёклы</b>, капусты и мяса.</p>
            <h2><span>Шаг</span> <span>первый</span></h2>
            <p>Сварите бульон.</p>
            <div><p>Добавьте овощи.</p></div>
            <h2>Подача</h2>
            <p>   </p>
            <p>Подавайте со сметаной.</p>
        </div>
    </body></html>"#;

    #[test]
    fn flattens_title_and_body_in_document_order() {
        let text = extract_article(ARTICLE, None).unwrap();
        assert_eq!(
            text,
            "Как приготовить борщ Борщ готовят из свёклы , капусты и мяса. Шаг первый \
             Сварите бульон. Добавьте овощи. Подача Подавайте со сметаной."
        );
    }

    #[test]
    fn output_begins_with_headline() {
        let text = extract_article(ARTICLE, None).unwrap();
        assert!(text.starts_with("Как приготовить борщ"));
    }

    #[test]
    fn falls_back_to_render_class_names() {
        let html = r#"<html><body>
            <h1 class="content--article-render__title-1g">  Title
               here </h1>
            <div class="content--article-render__container-1k"><p>Body text.</p></div>
        </body></html>"#;

        assert_eq!(extract_article(html, None).unwrap(), "Title here Body text.");
    }

    #[test]
    fn multi_line_paragraphs_collapse_to_single_spaces() {
        let html = "<h1 itemprop=headline>T</h1><div itemprop=articleBody>\
                    <p>line one\n      line two</p>\
                    <p>  tabs\there <i>and\n\n  italics</i>  </p></div>";

        assert_eq!(
            extract_article(html, None).unwrap(),
            "T line one line two tabs here and italics"
        );
    }

    #[test]
    fn missing_headline_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.html");
        let html = r#"<html><body><h1>No itemprop</h1><div itemprop="articleBody"><p>x</p></div></body></html>"#;

        let err = extract_article(html, Some(&path)).unwrap_err();

        assert!(matches!(err, AppError::ExtractionError(ref msg) if msg.contains("title")));
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("No itemprop"));
    }

    #[test]
    fn missing_body_is_an_extraction_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.html");
        let html = r#"<html><body><h1 itemprop="headline">Only a title</h1></body></html>"#;

        let err = extract_article(html, Some(&path)).unwrap_err();

        assert!(matches!(err, AppError::ExtractionError(ref msg) if msg.contains("body")));
        assert!(!path.exists());
    }
}
