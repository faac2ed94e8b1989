use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DB_PATH: &str = "devicedb";
const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    /// `None` disables the per-call storage timeout.
    pub storage_timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            storage_timeout: Some(Duration::from_millis(DEFAULT_STORAGE_TIMEOUT_MS)),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| dotenvy::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let bind_addr = lookup("SOKO_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let db_path = lookup("SOKO_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let storage_timeout = match lookup("SOKO_STORAGE_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("SOKO_STORAGE_TIMEOUT_MS is not a number: {raw}"))?;
                (ms > 0).then(|| Duration::from_millis(ms))
            }
            None => defaults.storage_timeout,
        };

        Ok(Self {
            bind_addr,
            db_path,
            storage_timeout,
        })
    }
}
