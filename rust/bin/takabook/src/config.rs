//! CLI configuration.
//!
//! Reads/writes `~/.takabook/config.toml`: who the operator is, which
//! factory is selected, and where the data lives.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use takabook_core::{PasswordAuthenticator, Principal, ServiceConfig};

/// The operator this CLI acts as.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operator {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,

    /// argon2id PHC string (set by `takabook operator set-password`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password_hash: String,
}

/// The factory commands run against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub operator: Operator,

    /// Selected factory; cleared by `takabook logout`.
    #[serde(rename = "current-factory", default, skip_serializing_if = "Option::is_none")]
    pub current_factory: Option<Selection>,

    #[serde(default)]
    pub storage: ServiceConfig,
}

impl CliConfig {
    /// Default config file path: ~/.takabook/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: CliConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Storage settings, with the data dir defaulting to ~/.takabook/data.
    pub fn service_config(&self) -> ServiceConfig {
        let defaults = ServiceConfig {
            data_dir: Some(dirs_path().join("data")),
            ..Default::default()
        };
        defaults.merged_with(&self.storage)
    }

    pub fn authenticator(&self) -> PasswordAuthenticator {
        PasswordAuthenticator::new(
            Principal {
                uid: self.operator.uid.clone(),
                email: self.operator.email.clone(),
            },
            self.operator.password_hash.clone(),
        )
    }
}

/// Return the takabook config directory (~/.takabook).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".takabook")
}
