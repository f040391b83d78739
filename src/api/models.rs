use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

pub const DEFAULT_MAX_LENGTH: u32 = 300;

fn default_max_length() -> u32 {
    DEFAULT_MAX_LENGTH
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub url: Url,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
}

impl SummaryRequest {
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.url.scheme(), "http" | "https") || self.url.host_str().is_none() {
            return Err(AppError::RequestError(format!(
                "url must be an absolute http(s) URL, got {}",
                self.url
            )));
        }
        if self.max_length == 0 {
            return Err(AppError::RequestError("max_length must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}
