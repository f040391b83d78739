pub mod api;
pub mod config;
pub mod dzen;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod llm;
pub mod logging;
pub mod render;
pub mod tokens;

use std::sync::Arc;
use config::Config;
use fetch::FetchRouter;
use llm::Summarizer;
use tokens::Truncator;

/// Application state shared across handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Arc<FetchRouter>,
    pub summarizer: Arc<Summarizer>,
}

impl AppState {
    pub fn new(config: Config, fetcher: FetchRouter, summarizer: Summarizer) -> Self {
        Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            summarizer: Arc::new(summarizer),
        }
    }

    pub fn from_config(config: Config) -> error::Result<Self> {
        let truncator = Arc::new(Truncator::cl100k()?);
        let fetcher = FetchRouter::from_config(&config)?;
        let summarizer = Summarizer::new(&config, truncator);
        Ok(Self::new(config, fetcher, summarizer))
    }
}
