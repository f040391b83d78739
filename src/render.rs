//! Headless browser rendering for pages that build their content client-side.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions};
use tracing::{error, info, warn};
use url::Url;

use crate::error::{AppError, Result};

/// Page title Dzen serves when it refuses automated clients.
pub const ACCESS_RESTRICTED_MARKER: &str = "Доступ ограничен";

/// Where blocking browser work runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// On tokio's blocking pool, so the async workers stay free during the
    /// settle delay.
    #[default]
    Offload,
    /// Directly on the calling task.
    Inline,
}

impl ExecutionMode {
    pub async fn run<T, F>(self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        match self {
            ExecutionMode::Inline => job(),
            ExecutionMode::Offload => tokio::task::spawn_blocking(job)
                .await
                .map_err(|e| AppError::RenderError(format!("render task failed: {e}")))?,
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "offload" => Ok(ExecutionMode::Offload),
            "inline" => Ok(ExecutionMode::Inline),
            other => Err(AppError::ConfigError(format!("Invalid RENDER_EXECUTION: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub title: String,
    pub html: String,
}

/// Loads a URL in a browser and returns the page after client-side rendering.
pub trait PageLoader: Send + Sync {
    fn load(&self, url: &Url) -> Result<RenderedPage>;
}

/// Launches a fresh headless Chrome for every load.
pub struct ChromeLoader {
    settle: Duration,
    chrome_path: Option<PathBuf>,
}

impl ChromeLoader {
    pub fn new(settle: Duration, chrome_path: Option<PathBuf>) -> Self {
        Self { settle, chrome_path }
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>> {
        LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(self.chrome_path.clone())
            .args(vec![
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--disable-dev-shm-usage"),
            ])
            .build()
            .map_err(|e| AppError::RenderError(format!("invalid browser options: {e}")))
    }
}

impl PageLoader for ChromeLoader {
    fn load(&self, url: &Url) -> Result<RenderedPage> {
        info!("launching browser for {url}");
        let session = BrowserSession::launch(self.launch_options()?)?;

        let tab = session.browser.new_tab().map_err(driver_error)?;
        info!("loading {url}");
        tab.navigate_to(url.as_str()).map_err(driver_error)?;
        if let Err(e) = tab.wait_until_navigated() {
            warn!("navigation did not settle for {url}: {e}");
        }
        std::thread::sleep(self.settle);

        let title = tab.get_title().map_err(driver_error)?;
        let html = tab.get_content().map_err(driver_error)?;
        Ok(RenderedPage { title, html })
    }
}

/// Owns the launched browser for one load. Dropping it drops the `Browser`,
/// whose own drop kills the Chrome child process.
struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    fn launch(options: LaunchOptions<'_>) -> Result<Self> {
        let browser = Browser::new(options).map_err(driver_error)?;
        Ok(Self { browser })
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        info!("shutting down browser");
    }
}

fn driver_error(e: impl std::fmt::Display) -> AppError {
    error!("browser driver error: {e}");
    AppError::RenderError(format!("browser driver error: {e}"))
}

/// Renders pages through a [`PageLoader`] and rejects access-restricted
/// responses.
pub struct PageRenderer {
    loader: Arc<dyn PageLoader>,
    mode: ExecutionMode,
}

impl PageRenderer {
    pub fn new(loader: Arc<dyn PageLoader>, mode: ExecutionMode) -> Self {
        Self { loader, mode }
    }

    pub async fn render(&self, url: &Url) -> Result<String> {
        let loader = Arc::clone(&self.loader);
        let target = url.clone();
        let page = self.mode.run(move || loader.load(&target)).await?;

        if page.title.contains(ACCESS_RESTRICTED_MARKER) {
            error!("access blocked while rendering {url}");
            return Err(AppError::RenderError("access to the page is restricted".to_string()));
        }

        info!("rendered {url} ({} bytes)", page.html.len());
        Ok(page.html)
    }
}
