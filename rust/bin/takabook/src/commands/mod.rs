//! Command implementations. Each opens the store, runs one service call
//! and prints the result.

pub mod beam;
pub mod entry;
pub mod factory;
pub mod operator;
pub mod report;
pub mod roster;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use takabook_core::ServiceError;
use takabook_production::service::report::ReportTable;
use takabook_production::{ProductionService, Session};

use tracing::error;

use crate::config::CliConfig;

/// Loaded config plus output preferences, shared by every command.
pub struct Ctx {
    pub config_path: PathBuf,
    pub config: CliConfig,
    pub json: bool,
}

impl Ctx {
    pub fn load(config_path: PathBuf, json: bool) -> Result<Self> {
        let config = CliConfig::load(&config_path)?;
        Ok(Self {
            config_path,
            config,
            json,
        })
    }

    pub fn save(&self) -> Result<()> {
        self.config.save(&self.config_path)
    }

    pub fn service(&self) -> Result<ProductionService> {
        let auth = Arc::new(self.config.authenticator());
        Ok(ProductionService::open(&self.config.service_config(), auth)?)
    }

    /// Service plus a session on the selected factory.
    pub fn session(&self) -> Result<(ProductionService, Session)> {
        let selected = self
            .config
            .current_factory
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No factory selected. Run `takabook factory use <id>`."))?;
        let svc = self.service()?;
        let session = svc.open_session(&selected.id)?;
        Ok((svc, session))
    }
}

/// The `--password` value, or an interactive prompt.
pub fn read_password(given: Option<String>) -> Result<String> {
    match given {
        Some(p) => Ok(p),
        None => Ok(rpassword::prompt_password("Password: ")?),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Left-aligned columns padded to the widest cell.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    let mut out = line(headers);
    for row in rows {
        out.push('\n');
        out.push_str(&line(row));
    }
    out
}

pub fn print_table(table: &ReportTable) {
    if table.is_empty() {
        println!("No production data found");
        return;
    }
    println!("{}", render_table(&table.headers, &table.rows));
}

/// Log store-side failures before they are printed. Input errors are
/// left to the caller's message. Returns whether anything was logged.
pub fn log_failure(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<ServiceError>() {
        Some(svc) if svc.is_remote_failure() => {
            error!(code = svc.error_code(), error = %svc, "store failure");
            true
        }
        _ => false,
    }
}

/// Build a header row from string literals.
pub fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_columns_align() {
        let out = render_table(
            &headers(&["Worker", "Total Meters"]),
            &[
                vec!["Ravi 1-3 7".into(), "200".into()],
                vec!["Asha".into(), "30.5".into()],
            ],
        );
        assert_eq!(
            out,
            "Worker      Total Meters\nRavi 1-3 7  200\nAsha        30.5"
        );
    }

    #[test]
    fn only_store_failures_are_logged() {
        let disk: anyhow::Error = ServiceError::Storage("disk full".into()).into();
        assert!(log_failure(&disk));

        let input: anyhow::Error = ServiceError::Validation("Invalid machine range".into()).into();
        assert!(!log_failure(&input));
        assert!(!log_failure(&anyhow::anyhow!("No factory selected.")));
    }
}
