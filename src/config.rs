use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,

    /// JSON document holding every attendance record.
    pub intern_file: PathBuf,

    /// Program hour quota used for `remainingHours`.
    pub total_intern_hours: f64,

    // Rate limiting, 0 disables it
    pub rate_api_per_min: u32,

    // Logging
    pub log_dir: PathBuf,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key -> value source; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server_addr: var("SERVER_ADDR", "0.0.0.0:3000"),
            intern_file: PathBuf::from(var("INTERN_FILE", "data/interns.json")),
            total_intern_hours: parse(&var("TOTAL_INTERN_HOURS", "486"), "TOTAL_INTERN_HOURS")?,
            rate_api_per_min: parse(&var("RATE_API_PER_MIN", "600"), "RATE_API_PER_MIN")?,
            log_dir: PathBuf::from(var("LOG_DIR", "logs")),
            log_level: parse(&var("LOG_LEVEL", "debug"), "LOG_LEVEL")?,
        })
    }
}

fn parse<T>(value: &str, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{} has an invalid value: {:?}", key, value))
}
