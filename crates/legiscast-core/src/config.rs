//! Configuration for the upstream data-fetch collaborator.
//!
//! The prediction pipeline itself reads no ambient state. The fetcher gets an
//! explicit [`FetchConfig`], resolved in this priority order:
//! 1. Explicit value (command-line flag)
//! 2. Environment variable
//! 3. `[fetch]` table of the TOML config file
//! 4. Compiled default (optional fields only)

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.congress.gov/v3";

pub const ENV_CONGRESS_API_KEY: &str = "CONGRESS_API_KEY";
pub const ENV_LEGISCAN_API_KEY: &str = "LEGISCAN_API_KEY";
pub const ENV_BASE_URL: &str = "CONGRESS_API_BASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not readable: {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("required setting `{key}` not provided (flag, ${env}, or config file)")]
    Missing { key: &'static str, env: &'static str },
}

/// Settings for the bill-data fetcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchConfig {
    pub congress_api_key: String,
    pub legiscan_api_key: Option<String>,
    pub base_url: String,
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct FetchOverrides {
    pub congress_api_key: Option<String>,
    pub legiscan_api_key: Option<String>,
    pub base_url: Option<String>,
}

impl FetchConfig {
    /// Resolve settings from overrides, an environment lookup, and an
    /// optional parsed config file.
    ///
    /// `env` is injected so callers (and tests) decide where variables come from.
    pub fn resolve(
        overrides: &FetchOverrides,
        env: impl Fn(&str) -> Option<String>,
        file: Option<&toml::Value>,
    ) -> Result<Self, ConfigError> {
        let from_file = |key: &str| -> Option<String> {
            file?
                .get("fetch")?
                .get(key)?
                .as_str()
                .map(str::to_string)
        };
        let nonblank = |v: &String| !v.trim().is_empty();
        let pick = |explicit: &Option<String>, env_key: &str, file_key: &str| {
            explicit
                .clone()
                .filter(nonblank)
                .or_else(|| env(env_key).filter(nonblank))
                .or_else(|| from_file(file_key).filter(nonblank))
        };

        let congress_api_key = pick(
            &overrides.congress_api_key,
            ENV_CONGRESS_API_KEY,
            "congress_api_key",
        )
        .ok_or(ConfigError::Missing {
            key: "congress_api_key",
            env: ENV_CONGRESS_API_KEY,
        })?;

        Ok(Self {
            congress_api_key,
            legiscan_api_key: pick(
                &overrides.legiscan_api_key,
                ENV_LEGISCAN_API_KEY,
                "legiscan_api_key",
            ),
            base_url: pick(&overrides.base_url, ENV_BASE_URL, "base_url")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Read and parse a TOML config file.
pub fn load_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}
