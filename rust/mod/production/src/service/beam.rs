//! Beams: shortage figures, the one-active-beam-per-machine transition and
//! point-in-time lookup.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use takabook_core::{new_id, round2, ServiceError};
use takabook_store::WriteBatch;
use tracing::{debug, info, warn};

use crate::model::{Beam, BeamTransition};
use crate::session::Session;
use super::ProductionService;

/// Produced meters against a beam and what is left of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamStats {
    pub produced: f64,
    /// Remaining meters, never negative.
    pub bhidan: f64,
    /// `bhidan` as a percentage of the declared total, two decimals.
    pub shortage_percent: f64,
}

impl BeamStats {
    pub fn compute(total_meters: f64, produced: f64) -> Self {
        let bhidan = (total_meters - produced).max(0.0);
        let shortage_percent = if total_meters > 0.0 {
            round2(bhidan / total_meters * 100.0)
        } else {
            0.0
        };
        Self {
            produced,
            bhidan,
            shortage_percent,
        }
    }

    /// `OK` while meters remain, `SHORT` once the beam is used up.
    pub fn status(&self) -> &'static str {
        if self.bhidan > 0.0 {
            "OK"
        } else {
            "SHORT"
        }
    }
}

/// Input for [`ProductionService::add_beam`].
#[derive(Debug, Clone)]
pub struct NewBeam {
    pub machine_number: u32,
    pub beam_no: String,
    pub total_meters: f64,
    pub start_date: NaiveDate,
}

/// Which beam was on a machine on a given date, answered from a beam list.
pub struct BeamResolver<'a> {
    beams: &'a [Beam],
}

impl<'a> BeamResolver<'a> {
    pub fn new(beams: &'a [Beam]) -> Self {
        Self { beams }
    }

    /// The beam of `machine_number` whose range contains `date`. When more
    /// than one does, the latest start wins.
    pub fn resolve(&self, machine_number: u32, date: NaiveDate) -> Option<&'a Beam> {
        self.beams
            .iter()
            .filter(|b| b.machine_number == machine_number && b.contains(date))
            .max_by_key(|b| b.start_date)
    }
}

/// Rejects NaN along with zero and negatives.
pub(crate) fn is_positive(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

impl ProductionService {
    // ── Beam ──

    /// Shortage figures for one beam, from every live entry booked to it.
    pub fn beam_stats(&self, session: &Session, beam: &Beam) -> Result<BeamStats, ServiceError> {
        let produced: f64 = self
            .live_entries(session, |e| e.beam_id == beam.id)?
            .iter()
            .map(|e| e.meters)
            .sum();
        Ok(BeamStats::compute(beam.total_meters, produced))
    }

    /// The machine's active beam, read from the store.
    pub fn active_beam(&self, session: &Session, machine_number: u32) -> Result<Option<Beam>, ServiceError> {
        let mut active = self.beams.find(&session.factory_id, |b| {
            b.machine_number == machine_number && b.is_active
        })?;
        active.sort_by_key(|b| b.start_date);
        Ok(active.pop())
    }

    /// Beams with the given active flag, by machine number.
    pub fn beams_by_status(&self, session: &Session, active: bool) -> Result<Vec<Beam>, ServiceError> {
        let mut beams = self.beams.find(&session.factory_id, |b| b.is_active == active)?;
        beams.sort_by(|a, b| {
            a.machine_number
                .cmp(&b.machine_number)
                .then(a.start_date.cmp(&b.start_date))
        });
        Ok(beams)
    }

    /// The beam on a machine on `date`, from the session's beam cache.
    pub fn resolve_beam(
        &self,
        session: &mut Session,
        machine_number: u32,
        date: NaiveDate,
    ) -> Result<Option<Beam>, ServiceError> {
        let beams = self.factory_beams(session)?;
        Ok(BeamResolver::new(beams).resolve(machine_number, date).cloned())
    }

    /// Mount a new beam on a machine, closing whatever beam is active there.
    ///
    /// Runs in three steps: write a `BeamTransition` marker, apply the
    /// close + open as one batch, delete the marker. A marker left behind
    /// by a crash is finished by [`Self::resume_beam_transitions`].
    pub fn add_beam(&self, session: &mut Session, input: NewBeam) -> Result<Beam, ServiceError> {
        let machine = self
            .find_machine(session, input.machine_number)?
            .ok_or_else(|| ServiceError::Validation("Invalid machine number".into()))?;
        let beam_no = input.beam_no.trim();
        if beam_no.is_empty() || !is_positive(input.total_meters) {
            return Err(ServiceError::Validation("Enter valid beam details".into()));
        }

        if let Some(pending) = self.transitions.get(&session.factory_id, &machine.id)? {
            warn!(machine = machine.machine_number, "finishing interrupted beam replacement first");
            self.apply_transition(&pending)?;
        }

        let closing: Vec<String> = self
            .beams
            .find(&session.factory_id, |b| b.machine_id == machine.id && b.is_active)?
            .into_iter()
            .map(|b| b.id)
            .collect();

        let marker = self.transitions.insert(BeamTransition {
            id: machine.id.clone(),
            factory_id: session.factory_id.clone(),
            machine_number: machine.machine_number,
            closing,
            opening: Beam {
                id: new_id(),
                factory_id: session.factory_id.clone(),
                machine_id: machine.id.clone(),
                machine_number: machine.machine_number,
                beam_no: beam_no.to_string(),
                total_meters: input.total_meters,
                start_date: input.start_date,
                end_date: None,
                is_active: true,
                created_at: None,
                updated_at: None,
            },
            started_at: None,
        })?;

        let beam = self.apply_transition(&marker)?;
        session.invalidate_beams();
        info!(
            factory = %session.factory_id,
            machine = machine.machine_number,
            beam = %beam.id,
            closed = marker.closing.len(),
            "beam mounted"
        );
        Ok(beam)
    }

    /// Correct a beam's number or declared length. Dates and state are
    /// left alone.
    pub fn edit_beam(
        &self,
        session: &mut Session,
        beam_id: &str,
        beam_no: &str,
        total_meters: f64,
    ) -> Result<Beam, ServiceError> {
        let beam_no = beam_no.trim();
        if beam_no.is_empty() || !is_positive(total_meters) {
            return Err(ServiceError::Validation("Invalid beam details".into()));
        }
        let mut beam = self.beams.get_or_err(&session.factory_id, beam_id)?;
        beam.beam_no = beam_no.to_string();
        beam.total_meters = total_meters;
        let beam = self.beams.save(beam)?;
        session.invalidate_beams();
        info!(factory = %session.factory_id, beam = beam_id, "beam edited");
        Ok(beam)
    }

    /// Beam replacements that were started but never finished.
    pub fn pending_beam_transitions(&self, session: &Session) -> Result<Vec<BeamTransition>, ServiceError> {
        self.transitions.list(&session.factory_id)
    }

    /// Finish every pending beam replacement. Returns how many were found.
    pub fn resume_beam_transitions(&self, session: &mut Session) -> Result<usize, ServiceError> {
        let pending = self.pending_beam_transitions(session)?;
        for marker in &pending {
            warn!(machine = marker.machine_number, beam = %marker.opening.id, "resuming beam replacement");
            self.apply_transition(marker)?;
        }
        if !pending.is_empty() {
            session.invalidate_beams();
        }
        Ok(pending.len())
    }

    /// Machine numbers that have more than one active beam.
    pub fn beam_conflicts(&self, session: &Session) -> Result<Vec<u32>, ServiceError> {
        let mut per_machine: BTreeMap<u32, usize> = BTreeMap::new();
        for beam in self.beams.find(&session.factory_id, |b| b.is_active)? {
            *per_machine.entry(beam.machine_number).or_default() += 1;
        }
        let conflicts: Vec<u32> = per_machine
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(machine, _)| machine)
            .collect();
        if !conflicts.is_empty() {
            warn!(factory = %session.factory_id, ?conflicts, "machines with several active beams");
        }
        Ok(conflicts)
    }

    /// Close the marker's old beams and insert its new one in one batch,
    /// then drop the marker. Safe to run more than once.
    fn apply_transition(&self, marker: &BeamTransition) -> Result<Beam, ServiceError> {
        let scope = &marker.factory_id;
        let mut batch = WriteBatch::new();
        for id in &marker.closing {
            match self.beams.get(scope, id)? {
                Some(mut old) if old.is_active => {
                    old.is_active = false;
                    old.end_date = Some(marker.opening.start_date);
                    batch.save(old)?;
                }
                Some(_) => debug!(beam = %id, "already closed"),
                None => warn!(beam = %id, "beam to close is missing"),
            }
        }
        let opened = match self.beams.get(scope, &marker.opening.id)? {
            Some(existing) => existing,
            None => batch.insert(marker.opening.clone())?,
        };
        batch.commit(self.kv.as_ref())?;
        self.transitions.delete(scope, &marker.id)?;
        Ok(opened)
    }
}
