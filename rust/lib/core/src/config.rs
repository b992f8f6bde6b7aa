use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Storage configuration shared by the library and the CLI.
///
/// The CLI fills this from its config file and command-line flags, then
/// passes it to storage initialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceConfig {
    /// Base directory for all local state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Path to the redb document store.
    /// Defaults to `{data_dir}/takabook.redb` if not specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,

    /// Directory CSV exports are written to.
    /// Defaults to `{data_dir}/exports/` if not specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}

impl ServiceConfig {
    /// Overlay values from `other` that are set, keeping ours otherwise.
    pub fn merged_with(mut self, other: &ServiceConfig) -> Self {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir.clone();
        }
        if other.db_path.is_some() {
            self.db_path = other.db_path.clone();
        }
        if other.export_dir.is_some() {
            self.export_dir = other.export_dir.clone();
        }
        self
    }

    /// Resolve the redb database path, falling back to `{data_dir}/takabook.redb`.
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("takabook.redb"))
    }

    /// Resolve the export directory.
    pub fn resolve_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("exports"))
    }

    fn resolve_data_subpath(&self, name: &str) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(|d| d.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let config = ServiceConfig {
            data_dir: Some(PathBuf::from("/data")),
            ..Default::default()
        };
        assert_eq!(config.resolve_db_path(), PathBuf::from("/data/takabook.redb"));
        assert_eq!(config.resolve_export_dir(), PathBuf::from("/data/exports"));
    }

    #[test]
    fn test_resolve_without_data_dir() {
        let config = ServiceConfig::default();
        assert_eq!(config.resolve_db_path(), PathBuf::from("takabook.redb"));
    }

    #[test]
    fn test_merge_prefers_set_values() {
        let file = ServiceConfig {
            data_dir: Some(PathBuf::from("/var/lib/takabook")),
            export_dir: Some(PathBuf::from("/srv/csv")),
            ..Default::default()
        };
        let flags = ServiceConfig {
            db_path: Some(PathBuf::from("/tmp/t.redb")),
            ..Default::default()
        };
        let merged = file.merged_with(&flags);
        assert_eq!(merged.resolve_db_path(), PathBuf::from("/tmp/t.redb"));
        assert_eq!(merged.resolve_export_dir(), PathBuf::from("/srv/csv"));
        assert_eq!(merged.data_dir, Some(PathBuf::from("/var/lib/takabook")));
    }
}
