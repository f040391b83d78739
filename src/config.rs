use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::logging::LogFormat;
use crate::render::ExecutionMode;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const MAX_INPUT_TOKENS: usize = 6000;
pub const MAX_TOKENS: u32 = 300;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub api_key: String,
    pub api_base_url: String,
    pub model: String,
    pub max_input_tokens: usize,
    pub max_tokens: u32,
    pub fetch_timeout: Duration,
    pub fetch_connect_timeout: Duration,
    pub render_settle: Duration,
    pub render_execution: ExecutionMode,
    pub chrome_path: Option<PathBuf>,
    pub debug_snapshot_path: PathBuf,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("DEEPSEEK_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("DEEPSEEK_API_KEY is not set".to_string()))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;
        let port = parse_or("PORT", &lookup, 8000u16)?;

        let render_execution = match lookup("RENDER_EXECUTION") {
            Some(raw) => raw.parse()?,
            None => ExecutionMode::default(),
        };
        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        let max_input_tokens = parse_or("MAX_INPUT_TOKENS", &lookup, MAX_INPUT_TOKENS)?;
        let max_tokens = parse_or("MAX_TOKENS", &lookup, MAX_TOKENS)?;
        if max_input_tokens == 0 || max_tokens == 0 {
            return Err(AppError::ConfigError("token limits must be positive".to_string()));
        }

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            api_key,
            api_base_url: lookup("DEEPSEEK_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup("DEEPSEEK_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_input_tokens,
            max_tokens,
            fetch_timeout: Duration::from_secs(parse_or("FETCH_TIMEOUT_SECS", &lookup, 10)?),
            fetch_connect_timeout: Duration::from_secs(parse_or(
                "FETCH_CONNECT_TIMEOUT_SECS",
                &lookup,
                5,
            )?),
            render_settle: Duration::from_secs(parse_or("RENDER_SETTLE_SECS", &lookup, 3)?),
            render_execution,
            chrome_path: lookup("CHROME_PATH").map(PathBuf::from),
            debug_snapshot_path: lookup("DEBUG_SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("debug.html")),
            log_format,
        })
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid {key}: {e}"))),
        None => Ok(default),
    }
}
