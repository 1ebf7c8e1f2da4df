//! # Configuration
//!
//! Application configuration loaded at startup.
//!
//! ## Configuration Sources (later wins)
//! 1. Defaults (this file)
//! 2. Config file: `--config PATH`, else `<platform config dir>/weft/config.toml`
//! 3. Environment variables (`WEFT_DB_PATH`, `WEFT_COMPANY_NAME`, `WEFT_LOG`)
//! 4. Command line flags (`--db`)
//!
//! ## Example `config.toml`
//! ```toml
//! log_filter = "info,sqlx=warn"
//!
//! [database]
//! path = "/srv/weft/weft.db"
//! max_connections = 5
//!
//! [business]
//! company_name = "Anka Textiles"
//! address_lines = ["Merter Tekstil Merkezi 12", "Istanbul"]
//! currency_symbol = "$"
//! ```

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use weft_core::receipt::CompanyHeader;

/// Default tracing filter when neither `RUST_LOG` nor `log_filter` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn,weft=info,sqlx=warn";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub business: BusinessConfig,
    /// tracing `EnvFilter` directives; `RUST_LOG` takes precedence.
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`.
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Company details printed on receipts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    pub company_name: String,
    pub address_lines: Vec<String>,
    pub currency_symbol: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: default_database_path(),
            max_connections: 5,
        }
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        BusinessConfig {
            company_name: "Weft Textiles".to_string(),
            address_lines: Vec::new(),
            currency_symbol: "$".to_string(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "weft", "weft")
}

/// Platform data directory database, or `./weft.db` when there is none.
///
/// - **Linux**: `~/.local/share/weft/weft.db`
/// - **macOS**: `~/Library/Application Support/com.weft.weft/weft.db`
/// - **Windows**: `%APPDATA%\weft\weft\data\weft.db`
pub fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("weft.db"))
        .unwrap_or_else(|| PathBuf::from("weft.db"))
}

/// `<platform config dir>/config.toml`, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

impl AppConfig {
    /// Loads defaults, then the config file, then the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => AppConfig::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Applies `WEFT_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("WEFT_DB_PATH").filter(|p| !p.trim().is_empty()) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(name) = lookup("WEFT_COMPANY_NAME") {
            if name.trim().is_empty() {
                warn!("WEFT_COMPANY_NAME is empty, keeping configured company name");
            } else {
                self.business.company_name = name;
            }
        }
        if let Some(filter) = lookup("WEFT_LOG").filter(|f| !f.trim().is_empty()) {
            self.log_filter = Some(filter);
        }
    }

    /// Rejects settings the database layer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.database.path.as_os_str().is_empty() {
            bail!("database path must not be empty");
        }
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be at least 1");
        }
        if self.business.currency_symbol.chars().count() > 4 {
            bail!("business.currency_symbol must be at most 4 characters");
        }
        Ok(())
    }

    /// Filter directives for the tracing subscriber, before `RUST_LOG`.
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    pub fn company_header(&self) -> CompanyHeader {
        CompanyHeader {
            name: self.business.company_name.clone(),
            address_lines: self.business.address_lines.clone(),
            currency_symbol: self.business.currency_symbol.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [business]
            company_name = "Anka Textiles"
            address_lines = ["Merter 12", "Istanbul"]
            "#,
        )
        .unwrap();

        assert_eq!(config.business.company_name, "Anka Textiles");
        assert_eq!(config.business.address_lines.len(), 2);
        assert_eq!(config.business.currency_symbol, "$");
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_full_toml() {
        let config = AppConfig::from_toml(
            r#"
            log_filter = "debug"

            [database]
            path = "/srv/weft/weft.db"
            max_connections = 2

            [business]
            currency_symbol = "€"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/srv/weft/weft.db"));
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(config.company_header().currency_symbol, "€");
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(AppConfig::from_toml("[database]\nmax_connections = \"many\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("WEFT_DB_PATH", "/tmp/other.db"),
            ("WEFT_COMPANY_NAME", "Deniz Tekstil"),
            ("WEFT_LOG", "trace"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.business.company_name, "Deniz Tekstil");
        assert_eq!(config.log_filter(), "trace");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = AppConfig::default();
        let before = config.clone();
        config.apply_env(|_| Some(" ".to_string()));
        assert_eq!(config, before);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let missing = std::env::temp_dir().join("weft-no-such-config.toml");
        assert!(AppConfig::load(Some(&missing)).is_err());
    }
}
