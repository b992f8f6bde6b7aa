//! Bulk entry grid: one row per assigned machine for a worker, date and
//! shift, saved in a single batch.

use chrono::NaiveDate;
use takabook_core::ServiceError;
use takabook_store::WriteBatch;
use tracing::info;

use crate::model::{shift_slot, EntryType, ProductionEntry, Shift};
use crate::session::Session;
use super::beam::BeamResolver;
use super::entry::latest_before;
use super::ProductionService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMode {
    /// Fresh rows built from the worker's assignment.
    Create,
    /// Rows loaded from entries already saved for this worker, date and shift.
    Edit,
}

/// One grid row. `meters` is kept as typed and parsed on save.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    /// Set when the row was loaded from a saved entry.
    pub entry_id: Option<String>,
    pub machine_id: String,
    pub machine_number: u32,
    pub beam_id: String,
    pub beam_no: String,
    pub taka_no: String,
    pub meters: String,
    pub entry_type: EntryType,
}

#[derive(Debug, Clone)]
pub struct BulkGrid {
    pub worker_id: String,
    pub worker_name: String,
    pub worker_label: String,
    pub business_date: NaiveDate,
    pub shift: Shift,
    pub mode: GridMode,
    rows: Vec<GridRow>,
}

impl BulkGrid {
    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut GridRow> {
        self.rows.get_mut(index)
    }

    /// Add an empty row for a machine already in the grid, right after that
    /// machine's last row. Returns the new row's index.
    pub fn add_split_row(&mut self, machine_number: u32) -> Option<usize> {
        let last = self.rows.iter().rposition(|r| r.machine_number == machine_number)?;
        let template = &self.rows[last];
        let row = GridRow {
            entry_id: None,
            machine_id: template.machine_id.clone(),
            machine_number,
            beam_id: template.beam_id.clone(),
            beam_no: template.beam_no.clone(),
            taka_no: String::new(),
            meters: String::new(),
            entry_type: EntryType::Normal,
        };
        self.rows.insert(last + 1, row);
        Some(last + 1)
    }

    /// Remove a row that has not been saved yet.
    pub fn remove_row(&mut self, index: usize) -> Result<GridRow, ServiceError> {
        match self.rows.get(index) {
            None => Err(ServiceError::Validation(format!("No row {index}"))),
            Some(row) if row.entry_id.is_some() => Err(ServiceError::Validation(
                "Saved rows cannot be removed here".into(),
            )),
            Some(_) => Ok(self.rows.remove(index)),
        }
    }

    /// Check every row and return the parsed meters, in row order.
    pub fn validate(&self) -> Result<Vec<f64>, ServiceError> {
        if self.rows.is_empty() {
            return Err(ServiceError::Validation("Nothing to save".into()));
        }
        self.rows
            .iter()
            .map(|row| {
                let n = row.machine_number;
                if row.taka_no.trim().is_empty() {
                    return Err(ServiceError::Validation(format!("Taka number required for Machine {n}")));
                }
                let raw = row.meters.trim();
                if raw.is_empty() {
                    return Err(ServiceError::Validation(format!("Meters required for Machine {n}")));
                }
                let meters: f64 = raw
                    .parse()
                    .ok()
                    .filter(|m: &f64| m.is_finite())
                    .ok_or_else(|| ServiceError::Validation(format!("Meters must be a number for Machine {n}")))?;
                if meters < 0.0 {
                    return Err(ServiceError::Validation(format!("Meters cannot be negative for Machine {n}")));
                }
                Ok(meters)
            })
            .collect()
    }
}

impl ProductionService {
    // ── Bulk grid ──

    /// Build the grid for a worker, date and shift.
    ///
    /// Saved entries for that combination are loaded for editing. Otherwise
    /// one row per assigned machine is created, each on the beam mounted on
    /// that date and pre-filled with the machine's previous taka number.
    pub fn load_bulk_grid(
        &self,
        session: &mut Session,
        worker_id: &str,
        business_date: NaiveDate,
        shift: Shift,
    ) -> Result<BulkGrid, ServiceError> {
        let worker = self.get_worker(session, worker_id)?;
        let worker_label = self.worker_label(session, &worker)?;

        let mut saved = self.live_entries(session, |e| {
            e.worker_id.as_deref() == Some(worker_id)
                && e.shift == Some(shift)
                && e.business_date == business_date
        })?;
        let mut grid = BulkGrid {
            worker_id: worker.id.clone(),
            worker_name: worker.name.clone(),
            worker_label,
            business_date,
            shift,
            mode: GridMode::Edit,
            rows: Vec::new(),
        };

        if !saved.is_empty() {
            saved.sort_by(|a, b| {
                a.machine_number
                    .cmp(&b.machine_number)
                    .then(a.recorded_at.cmp(&b.recorded_at))
            });
            grid.rows = saved
                .into_iter()
                .map(|e| GridRow {
                    entry_id: Some(e.id),
                    machine_id: e.machine_id,
                    machine_number: e.machine_number,
                    beam_id: e.beam_id,
                    beam_no: e.beam_no,
                    taka_no: e.taka_no,
                    meters: e.meters.to_string(),
                    entry_type: e.entry_type,
                })
                .collect();
            return Ok(grid);
        }

        let assignment = self
            .active_assignment(session, worker_id)?
            .ok_or_else(|| ServiceError::Validation("No machines assigned to this worker".into()))?;
        let machines = self.factory_machines(session)?.to_vec();
        let beams = self.factory_beams(session)?.to_vec();
        let resolver = BeamResolver::new(&beams);
        let history = self.live_entries(session, |_| true)?;
        let target = shift_slot(business_date, Some(shift));

        grid.mode = GridMode::Create;
        for n in assignment.machine_numbers() {
            let machine = machines
                .iter()
                .find(|m| m.machine_number == n)
                .ok_or_else(|| ServiceError::NotFound(format!("Machine {n} does not exist")))?;
            let beam = resolver
                .resolve(n, business_date)
                .ok_or_else(|| ServiceError::NotFound(format!("No beam on Machine {n} for {business_date}")))?;
            let taka_no = latest_before(&history, n, target)
                .map(|e| e.taka_no.clone())
                .unwrap_or_default();
            grid.rows.push(GridRow {
                entry_id: None,
                machine_id: machine.id.clone(),
                machine_number: n,
                beam_id: beam.id.clone(),
                beam_no: beam.beam_no.clone(),
                taka_no,
                meters: String::new(),
                entry_type: EntryType::Normal,
            });
        }
        Ok(grid)
    }

    /// Validate the whole grid, then write every row in one batch.
    /// Returns the number of documents written.
    pub fn save_bulk_grid(&self, session: &Session, grid: &BulkGrid) -> Result<usize, ServiceError> {
        let meters = grid.validate()?;

        let mut batch = WriteBatch::new();
        for (row, meters) in grid.rows.iter().zip(meters) {
            match &row.entry_id {
                Some(id) => {
                    let mut stored = self.production.get_or_err(&session.factory_id, id)?;
                    stored.taka_no = row.taka_no.clone();
                    stored.meters = meters;
                    stored.entry_type = row.entry_type;
                    if row.entry_type == EntryType::Normal {
                        stored.worker_id = Some(grid.worker_id.clone());
                        stored.worker_name = grid.worker_name.clone();
                        stored.worker_label = grid.worker_label.clone();
                    }
                    batch.save(stored)?;
                }
                None => {
                    batch.insert(ProductionEntry {
                        id: String::new(),
                        factory_id: session.factory_id.clone(),
                        machine_id: row.machine_id.clone(),
                        machine_number: row.machine_number,
                        beam_id: row.beam_id.clone(),
                        beam_no: row.beam_no.clone(),
                        worker_id: Some(grid.worker_id.clone()),
                        worker_name: grid.worker_name.clone(),
                        worker_label: grid.worker_label.clone(),
                        shift: Some(grid.shift),
                        taka_no: row.taka_no.clone(),
                        meters,
                        entry_type: row.entry_type,
                        count_in_worker: true,
                        business_date: grid.business_date,
                        recorded_at: None,
                        updated_at: None,
                        deleted_at: None,
                    })?;
                }
            }
        }
        let written = batch.commit(self.kv.as_ref())?;
        info!(
            factory = %session.factory_id,
            worker = %grid.worker_id,
            date = %grid.business_date,
            shift = %grid.shift,
            rows = written,
            "bulk grid saved"
        );
        Ok(written)
    }
}
