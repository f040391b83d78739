use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::{error, info};
use url::Url;

use crate::config::Config;
use crate::dzen;
use crate::error::{AppError, Result};
use crate::extract;
use crate::render::{ChromeLoader, PageRenderer};

pub const DZEN_DOMAIN: &str = "dzen.ru";

/// Produces the article text behind a URL.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch_text(&self, url: &Url) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// The domain itself or any subdomain of it.
    Domain(String),
}

impl HostPattern {
    pub fn domain(domain: &str) -> Self {
        HostPattern::Domain(domain.to_ascii_lowercase())
    }

    pub fn matches(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        match self {
            HostPattern::Domain(domain) => {
                host == *domain
                    || host
                        .strip_suffix(domain.as_str())
                        .is_some_and(|rest| rest.ends_with('.'))
            }
        }
    }
}

/// Picks a [`TextSource`] by URL host, falling back to generic extraction.
pub struct FetchRouter {
    routes: Vec<(HostPattern, Arc<dyn TextSource>)>,
    fallback: Arc<dyn TextSource>,
}

impl FetchRouter {
    pub fn new(routes: Vec<(HostPattern, Arc<dyn TextSource>)>, fallback: Arc<dyn TextSource>) -> Self {
        Self { routes, fallback }
    }

    /// Dzen through a headless browser, everything else over plain HTTP.
    pub fn from_config(config: &Config) -> Result<Self> {
        let loader = ChromeLoader::new(config.render_settle, config.chrome_path.clone());
        let renderer = PageRenderer::new(Arc::new(loader), config.render_execution);
        let dzen = DzenSource::new(renderer, Some(config.debug_snapshot_path.clone()));
        let generic = GenericSource::from_config(config)?;

        Ok(Self::new(
            vec![(HostPattern::domain(DZEN_DOMAIN), Arc::new(dzen) as Arc<dyn TextSource>)],
            Arc::new(generic),
        ))
    }

    pub fn source_for(&self, url: &Url) -> &Arc<dyn TextSource> {
        let host = url.host_str().unwrap_or_default();
        self.routes
            .iter()
            .find(|(pattern, _)| pattern.matches(host))
            .map(|(_, source)| source)
            .unwrap_or(&self.fallback)
    }

    pub async fn fetch_text(&self, url: &Url) -> Result<String> {
        let text = self.source_for(url).fetch_text(url).await?;
        if text.trim().is_empty() {
            return Err(AppError::ExtractionError("no text could be extracted".to_string()));
        }
        Ok(text)
    }
}

/// Plain HTTP download followed by readability extraction.
pub struct GenericSource {
    client: Client,
}

impl GenericSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.fetch_timeout)
            .connect_timeout(config.fetch_connect_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl TextSource for GenericSource {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        info!("downloading {url}");
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            error!("{url} answered {status}");
            return Err(AppError::ExtractionError(format!("page returned {status}")));
        }

        let html = response.text().await?;
        info!("downloaded {} bytes from {url}", html.len());

        extract::extract_article(&html, Some(url.as_str()))
            .ok_or_else(|| AppError::ExtractionError("no text could be extracted".to_string()))
    }
}

/// Headless render followed by Dzen-specific extraction.
pub struct DzenSource {
    renderer: PageRenderer,
    snapshot_path: Option<PathBuf>,
}

impl DzenSource {
    pub fn new(renderer: PageRenderer, snapshot_path: Option<PathBuf>) -> Self {
        Self { renderer, snapshot_path }
    }
}

#[async_trait]
impl TextSource for DzenSource {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        info!("processing dzen article {url}");
        let html = self.renderer.render(url).await?;
        dzen::extract_article(&html, self.snapshot_path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ExecutionMode, PageLoader, RenderedPage};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixed(&'static str);

    #[async_trait]
    impl TextSource for Fixed {
        async fn fetch_text(&self, _url: &Url) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct StaticPage(&'static str);

    impl PageLoader for StaticPage {
        fn load(&self, _url: &Url) -> Result<RenderedPage> {
            Ok(RenderedPage {
                title: "Дзен".to_string(),
                html: self.0.to_string(),
            })
        }
    }

    fn router() -> FetchRouter {
        FetchRouter::new(
            vec![(HostPattern::domain(DZEN_DOMAIN), Arc::new(Fixed("dzen")) as Arc<dyn TextSource>)],
            Arc::new(Fixed("generic")),
        )
    }

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn domain_pattern_matches_host_and_subdomains() {
        let pattern = HostPattern::domain("dzen.ru");
        assert!(pattern.matches("dzen.ru"));
        assert!(pattern.matches("www.dzen.ru"));
        assert!(pattern.matches("DZEN.RU"));
        assert!(!pattern.matches("notdzen.ru"));
        assert!(!pattern.matches("dzen.ru.example.com"));
    }

    #[tokio::test]
    async fn routes_by_host() {
        let router = router();
        assert_eq!(router.fetch_text(&url("https://dzen.ru/a/xyz")).await.unwrap(), "dzen");
        assert_eq!(router.fetch_text(&url("https://m.dzen.ru/a/xyz")).await.unwrap(), "dzen");
        assert_eq!(router.fetch_text(&url("https://example.com/a")).await.unwrap(), "generic");
    }

    #[tokio::test]
    async fn blank_text_is_an_extraction_failure() {
        let router = FetchRouter::new(vec![], Arc::new(Fixed("  \n ")));
        let err = router.fetch_text(&url("https://example.com/")).await.unwrap_err();
        assert!(matches!(err, AppError::ExtractionError(_)));
    }

    #[tokio::test]
    async fn generic_source_extracts_page_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><article><h1>Headline</h1>\
                 <p>The harbour reopened on Monday after a week of repairs to the sea wall.</p>\
                 <p>Fishing boats returned by noon and the market was busy again by evening.</p>\
                 </article></body></html>",
            ))
            .mount(&server)
            .await;

        let source = GenericSource::new(Client::new());
        let text = source
            .fetch_text(&url(&format!("{}/article", server.uri())))
            .await
            .unwrap();

        assert!(text.contains("harbour reopened"));
        assert!(!text.contains('<'));
    }

    #[tokio::test]
    async fn generic_source_maps_error_status_to_extraction_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = GenericSource::new(Client::new());
        let err = source
            .fetch_text(&url(&format!("{}/missing", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExtractionError(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_connection_failure() {
        let source = GenericSource::new(Client::new());
        let err = source.fetch_text(&url("http://127.0.0.1:1/")).await.unwrap_err();
        assert!(matches!(err, AppError::ConnectionError(_)));
    }

    #[tokio::test]
    async fn dzen_source_extracts_rendered_article() {
        let html = r#"<html><body><h1 itemprop="headline">Заголовок</h1>
            <div itemprop="articleBody"><p>Текст статьи.</p></div></body></html>"#;
        let renderer = PageRenderer::new(Arc::new(StaticPage(html)), ExecutionMode::Inline);
        let source = DzenSource::new(renderer, None);

        let text = source.fetch_text(&url("https://dzen.ru/a/xyz")).await.unwrap();
        assert_eq!(text, "Заголовок Текст статьи.");
    }
}
