use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Destructive actions that must leave an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    DeleteWorker,
    DeleteProduction,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeleteWorker => "DELETE_WORKER",
            Self::DeleteProduction => "DELETE_PRODUCTION",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only record of a destructive action. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: String,
    pub factory_id: String,
    pub action: AuditAction,
    pub entity: String,
    pub entity_id: String,
    pub details: String,
    pub performed_by: String,
    /// Assigned by the store layer when the record is written.
    #[serde(default)]
    pub performed_at: Option<DateTime<Utc>>,
}
