//! Mediadesk Configuration
//!
//! Loaded once at startup from a TOML file, then overridden from the
//! environment. Never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const CONFIG_PATH_ENV: &str = "MD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/mediadesk.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Tenant used when a request carries no organization or user header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    pub id: String,
    pub default_user: String,
    pub admin_role: String,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            id: "default_org".to_string(),
            default_user: "admin".to_string(),
            admin_role: "ROLE_ADMIN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub server: ServerConfig,
    pub organization: OrganizationConfig,
    /// Populate the in-memory backends with sample records.
    pub seed_demo_data: bool,
}

impl AdminConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `MD_CONFIG` (or the default path) and apply environment
    /// overrides. A missing file yields the built-in defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config = if path.exists() {
            info!(path = %path.display(), "Loading configuration");
            Self::from_file(&path)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `MD_*` overrides read through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(host) = lookup("MD_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("MD_PORT") {
            self.server.port = parse_value("MD_PORT", &port)?;
        }
        if let Some(org) = lookup("MD_ORGANIZATION") {
            self.organization.id = org;
        }
        if let Some(user) = lookup("MD_DEFAULT_USER") {
            self.organization.default_user = user;
        }
        if let Some(seed) = lookup("MD_SEED_DEMO_DATA") {
            self.seed_demo_data = parse_flag("MD_SEED_DEMO_DATA", &seed)?;
        }
        Ok(self)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AdminConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.organization.id, "default_org");
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AdminConfig::from_toml_str(
            r#"
            [server]
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.organization.default_user, "admin");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "seed_demo_data = true\n[organization]\nid = \"campus\"\nadmin_role = \"ROLE_CAMPUS_ADMIN\""
        )
        .unwrap();

        let config = AdminConfig::from_file(file.path()).unwrap();
        assert!(config.seed_demo_data);
        assert_eq!(config.organization.id, "campus");
        assert_eq!(config.organization.admin_role, "ROLE_CAMPUS_ADMIN");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AdminConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let err = AdminConfig::from_toml_str("server = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = AdminConfig::default()
            .with_overrides(env(&[
                ("MD_PORT", "7070"),
                ("MD_ORGANIZATION", "campus"),
                ("MD_SEED_DEMO_DATA", "yes"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.server.bind_address(), "0.0.0.0:7070");
        assert_eq!(config.organization.id, "campus");
        assert!(config.seed_demo_data);
    }

    #[test]
    fn test_invalid_env_override() {
        let err = AdminConfig::default()
            .with_overrides(env(&[("MD_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MD_PORT"));
    }
}
