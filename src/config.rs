//! Application configuration.
//!
//! Precedence: CLI > environment > config files > defaults. Files are looked up
//! in order: `--config`, `$FOLIO_CONFIG`, `~/.config/folio.toml`, `./folio.toml`;
//! an earlier file wins per field.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::AggError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_path: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_retention: Option<usize>,
    pub default_sample: Option<String>,
    pub dev6: Option<bool>,
}

impl AppConfig {
    /// # Errors
    /// Returns `Config` when the text is not valid TOML for this shape.
    pub fn from_toml_str(s: &str) -> Result<Self, AggError> {
        toml::from_str(s).map_err(|e| AggError::Config(e.to_string()))
    }

    /// # Errors
    /// Returns `Io` if the file cannot be read and `Config` if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, AggError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s).map_err(|e| AggError::Config(format!("{}: {e}", path.display())))
    }

    /// Fills every unset field from `other`.
    pub fn fill_from(&mut self, other: Self) {
        if self.data_path.is_none() {
            self.data_path = other.data_path;
        }
        if self.log_dir.is_none() {
            self.log_dir = other.log_dir;
        }
        if self.log_level.is_none() {
            self.log_level = other.log_level;
        }
        if self.log_retention.is_none() {
            self.log_retention = other.log_retention;
        }
        if self.default_sample.is_none() {
            self.default_sample = other.default_sample;
        }
        if self.dev6.is_none() {
            self.dev6 = other.dev6;
        }
    }

    /// Reads `FOLIO_*` variables through `get`, so callers can inject a lookup.
    #[must_use]
    pub fn from_env_with<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        Self {
            data_path: get("FOLIO_DATA").map(PathBuf::from),
            log_dir: get("FOLIO_LOG_DIR").map(PathBuf::from),
            log_level: get("FOLIO_LOG_LEVEL"),
            log_retention: get("FOLIO_LOG_RETENTION").and_then(|s| s.parse::<usize>().ok()),
            default_sample: get("FOLIO_DEFAULT_SAMPLE"),
            dev6: get("FOLIO_DEV6").and_then(|s| match s.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Some(true),
                "0" | "false" | "no" => Some(false),
                _ => None,
            }),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|k| std::env::var(k).ok())
    }
}

#[must_use]
pub fn find_config_paths(cli_cfg: Option<&Path>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = vec![];
    if let Some(p) = cli_cfg {
        paths.push(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("FOLIO_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Ok(home) = std::env::var("USERPROFILE").or_else(|_| std::env::var("HOME")) {
        paths.push(PathBuf::from(home).join(".config").join("folio.toml"));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join("folio.toml"));
    }
    paths
}

/// Merges `cli` overrides with the environment and every existing config file.
///
/// # Errors
/// An explicit `cli_cfg` path that does not exist is a `Config` error; any
/// config file that fails to parse is reported as well.
pub fn load(cli_cfg: Option<&Path>, cli: AppConfig) -> Result<AppConfig, AggError> {
    if let Some(p) = cli_cfg
        && !p.exists()
    {
        return Err(AggError::Config(format!("config file not found: {}", p.display())));
    }
    let mut cfg = cli;
    cfg.fill_from(AppConfig::from_env());
    for p in find_config_paths(cli_cfg) {
        if p.exists() {
            log::debug!("loading config from {}", p.display());
            cfg.fill_from(AppConfig::from_file(&p)?);
        }
    }
    Ok(cfg)
}
