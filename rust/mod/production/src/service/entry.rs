use chrono::{NaiveDate, NaiveDateTime};
use takabook_core::{now, ServiceError};
use tracing::{debug, info};

use crate::model::{shift_slot, AuditAction, EntryType, ProductionEntry, Shift};
use crate::session::Session;
use super::audit::AuditRecord;
use super::beam::is_positive;
use super::ProductionService;

/// The entry on `machine_number` with the greatest slot strictly before
/// `target`; equal slots go to the later write.
pub(crate) fn latest_before(
    entries: &[ProductionEntry],
    machine_number: u32,
    target: NaiveDateTime,
) -> Option<&ProductionEntry> {
    entries
        .iter()
        .filter(|e| e.machine_number == machine_number && e.slot() < target)
        .max_by(|a, b| {
            a.slot()
                .cmp(&b.slot())
                .then(a.recorded_at.cmp(&b.recorded_at))
        })
}

/// Input for [`ProductionService::record_entry`].
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub machine_number: u32,
    pub worker_id: String,
    pub shift: Shift,
    pub taka_no: String,
    pub meters: f64,
    pub business_date: NaiveDate,
}

impl ProductionService {
    // ── Production entry ──

    /// Record one taka against the machine's active beam.
    pub fn record_entry(&self, session: &mut Session, input: NewEntry) -> Result<ProductionEntry, ServiceError> {
        let machine = self
            .find_machine(session, input.machine_number)?
            .ok_or_else(|| ServiceError::Validation("Invalid machine number".into()))?;
        let worker = self.get_worker(session, &input.worker_id)?;
        if input.taka_no.trim().is_empty() || !is_positive(input.meters) {
            return Err(ServiceError::Validation("Please fill all fields correctly".into()));
        }
        let beam = self
            .active_beam(session, machine.machine_number)?
            .ok_or_else(|| ServiceError::Validation("No active beam on this machine".into()))?;
        let worker_label = self.worker_label(session, &worker)?;

        let entry = self.production.insert(ProductionEntry {
            id: String::new(),
            factory_id: session.factory_id.clone(),
            machine_id: machine.id,
            machine_number: machine.machine_number,
            beam_id: beam.id,
            beam_no: beam.beam_no,
            worker_id: Some(worker.id),
            worker_name: worker.name,
            worker_label,
            shift: Some(input.shift),
            taka_no: input.taka_no,
            meters: input.meters,
            entry_type: EntryType::Normal,
            count_in_worker: true,
            business_date: input.business_date,
            recorded_at: None,
            updated_at: None,
            deleted_at: None,
        })?;
        info!(
            factory = %session.factory_id,
            entry = %entry.id,
            machine = entry.machine_number,
            taka = %entry.taka_no,
            "entry recorded"
        );
        Ok(entry)
    }

    /// Live entries of one business day, by machine then slot.
    pub fn entries_on(&self, session: &Session, date: NaiveDate) -> Result<Vec<ProductionEntry>, ServiceError> {
        let mut entries = self.live_entries(session, |e| e.business_date == date)?;
        entries.sort_by(|a, b| {
            a.machine_number
                .cmp(&b.machine_number)
                .then(a.slot().cmp(&b.slot()))
                .then(a.recorded_at.cmp(&b.recorded_at))
        });
        Ok(entries)
    }

    /// Taka number of the machine's most recent entry before the given
    /// slot, or an empty string when there is none.
    ///
    /// Entries sharing a slot are ordered by when they were recorded.
    pub fn last_taka_before(
        &self,
        session: &Session,
        machine_number: u32,
        date: NaiveDate,
        shift: Option<Shift>,
    ) -> Result<String, ServiceError> {
        let target = shift_slot(date, shift);
        let entries = self.live_entries(session, |e| e.machine_number == machine_number)?;
        let previous = latest_before(&entries, machine_number, target);
        debug!(machine = machine_number, %target, found = previous.is_some(), "last taka lookup");
        Ok(previous.map(|e| e.taka_no.clone()).unwrap_or_default())
    }

    /// Soft-delete an entry behind password re-confirmation.
    pub fn delete_entry(&self, session: &Session, entry_id: &str, password: &str) -> Result<(), ServiceError> {
        let record = AuditRecord {
            action: AuditAction::DeleteProduction,
            entity: "production",
            entity_id: entry_id,
            details: "Deleted production entry",
        };
        self.audited(session, password, record, |batch| {
            let mut entry = self
                .production
                .get(&session.factory_id, entry_id)?
                .filter(|e| e.is_live())
                .ok_or_else(|| ServiceError::NotFound(format!("production '{entry_id}' not found")))?;
            entry.deleted_at = Some(now());
            batch.save(entry)?;
            info!(factory = %session.factory_id, entry = entry_id, "entry deleted");
            Ok(())
        })
    }
}
