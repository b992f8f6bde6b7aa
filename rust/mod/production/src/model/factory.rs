use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A factory (tenant). Every other record is scoped by its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Factory {
    pub id: String,
    pub name: String,
    pub machine_count: u32,
    /// Owner's user id.
    pub created_by: String,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One loom of a factory. The set is fixed when the factory is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    /// `machine_{n}`.
    pub id: String,
    pub factory_id: String,
    pub machine_number: u32,
    pub status: String,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Machine {
    pub fn id_for(machine_number: u32) -> String {
        format!("machine_{machine_number}")
    }
}
