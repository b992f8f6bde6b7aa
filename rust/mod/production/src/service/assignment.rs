//! Machine-range assignment editing.
//!
//! A [`RangeEditor`] stages ranges for one worker; nothing is stored until
//! [`ProductionService::commit_assignment`] supersedes the worker's active
//! assignment in one batch.

use std::collections::BTreeSet;

use takabook_core::{now, ServiceError};
use takabook_store::WriteBatch;
use tracing::info;

use crate::model::{Assignment, AssignmentStatus, Machine, MachineRange, Worker};
use crate::session::Session;
use super::ProductionService;

/// Staged machine ranges for one worker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeEditor {
    ranges: Vec<MachineRange>,
}

impl RangeEditor {
    pub fn new(ranges: Vec<MachineRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[MachineRange] {
        &self.ranges
    }

    /// Stage `from..=to` after checking it against the factory's machines
    /// and the ranges already staged.
    pub fn add_range(&mut self, machines: &[Machine], from: u32, to: u32) -> Result<(), ServiceError> {
        if from < 1 || to < 1 || from > to {
            return Err(ServiceError::Validation("Invalid machine range".into()));
        }
        let known: BTreeSet<u32> = machines.iter().map(|m| m.machine_number).collect();
        if let Some(missing) = (from..=to).find(|n| !known.contains(n)) {
            return Err(ServiceError::Validation(format!("Machine {missing} does not exist")));
        }
        let range = MachineRange::new(from, to);
        if self.ranges.iter().any(|r| r.overlaps(&range)) {
            return Err(ServiceError::Validation(
                "This range overlaps with an existing range".into(),
            ));
        }
        self.ranges.push(range);
        Ok(())
    }

    /// Drop the staged range at `index`. Out-of-range indexes are ignored.
    pub fn remove_range(&mut self, index: usize) -> Option<MachineRange> {
        (index < self.ranges.len()).then(|| self.ranges.remove(index))
    }
}

impl ProductionService {
    // ── Assignment ──

    /// The worker's active assignment, if any.
    pub fn active_assignment(
        &self,
        session: &mut Session,
        worker_id: &str,
    ) -> Result<Option<Assignment>, ServiceError> {
        self.active_assignments(session)?;
        Ok(session.active_assignment_for(worker_id).cloned())
    }

    /// An editor seeded with the worker's current ranges.
    pub fn range_editor(&self, session: &mut Session, worker: &Worker) -> Result<RangeEditor, ServiceError> {
        let ranges = self
            .active_assignment(session, &worker.id)?
            .map(|a| a.ranges)
            .unwrap_or_default();
        Ok(RangeEditor::new(ranges))
    }

    /// Replace the worker's active assignment with the staged ranges.
    ///
    /// Old assignments are closed and the new one inserted in the same
    /// batch, so a reader never sees zero or two active assignments.
    pub fn commit_assignment(
        &self,
        session: &mut Session,
        worker: &Worker,
        editor: &RangeEditor,
    ) -> Result<Assignment, ServiceError> {
        if editor.ranges.is_empty() {
            return Err(ServiceError::Validation("Add at least one machine range".into()));
        }
        let stamp = now();
        let previous = self.assignments.find(&session.factory_id, |a| {
            a.worker_id == worker.id && a.is_active()
        })?;

        let mut batch = WriteBatch::new();
        for mut old in previous {
            old.status = AssignmentStatus::Inactive;
            old.valid_to = Some(stamp);
            batch.save(old)?;
        }
        let assignment = batch.insert(Assignment {
            id: String::new(),
            factory_id: session.factory_id.clone(),
            worker_id: worker.id.clone(),
            worker_name: worker.name.clone(),
            ranges: editor.ranges.clone(),
            status: AssignmentStatus::Active,
            valid_from: Some(stamp),
            valid_to: None,
            created_at: None,
            updated_at: None,
        })?;
        let written = batch.commit(self.kv.as_ref())?;
        session.invalidate_assignments();

        info!(
            factory = %session.factory_id,
            worker = %worker.id,
            assignment = %assignment.id,
            superseded = written - 1,
            "assignment committed"
        );
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use takabook_core::ServiceError;

    use super::*;
    use crate::service::testutil::fixture;

    fn machines(n: u32) -> Vec<Machine> {
        (1..=n)
            .map(|i| Machine {
                id: Machine::id_for(i),
                factory_id: "f".into(),
                machine_number: i,
                status: "idle".into(),
                is_active: true,
                created_at: None,
            })
            .collect()
    }

    fn message(err: ServiceError) -> String {
        match err {
            ServiceError::Validation(m) => m,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn add_range_validates() {
        let m = machines(8);
        let mut editor = RangeEditor::default();
        editor.add_range(&m, 1, 3).unwrap();

        assert_eq!(message(editor.add_range(&m, 0, 2).unwrap_err()), "Invalid machine range");
        assert_eq!(message(editor.add_range(&m, 5, 4).unwrap_err()), "Invalid machine range");
        assert_eq!(message(editor.add_range(&m, 7, 9).unwrap_err()), "Machine 9 does not exist");
        assert_eq!(
            message(editor.add_range(&m, 3, 5).unwrap_err()),
            "This range overlaps with an existing range"
        );
        editor.add_range(&m, 7, 7).unwrap();
        assert_eq!(editor.ranges(), &[MachineRange::new(1, 3), MachineRange::new(7, 7)]);
    }

    #[test]
    fn remove_range_by_index() {
        let mut editor = RangeEditor::new(vec![MachineRange::new(1, 2), MachineRange::new(4, 4)]);
        assert_eq!(editor.remove_range(5), None);
        assert_eq!(editor.remove_range(0), Some(MachineRange::new(1, 2)));
        assert_eq!(editor.ranges(), &[MachineRange::new(4, 4)]);
    }

    #[test]
    fn empty_commit_is_rejected() {
        let mut fx = fixture(4);
        let w = fx.svc.add_worker(&fx.session, "Ravi", None).unwrap();
        let err = fx
            .svc
            .commit_assignment(&mut fx.session, &w, &RangeEditor::default())
            .unwrap_err();
        assert_eq!(message(err), "Add at least one machine range");
    }

    #[test]
    fn commit_supersedes_previous_assignment() {
        let mut fx = fixture(8);
        let w = fx.svc.add_worker(&fx.session, "Ravi", None).unwrap();

        let first = fx
            .svc
            .commit_assignment(&mut fx.session, &w, &RangeEditor::new(vec![MachineRange::new(1, 2)]))
            .unwrap();

        let mut editor = fx.svc.range_editor(&mut fx.session, &w).unwrap();
        assert_eq!(editor.ranges(), &[MachineRange::new(1, 2)]);
        let m = fx.svc.factory_machines(&mut fx.session).unwrap().to_vec();
        editor.add_range(&m, 5, 6).unwrap();
        let second = fx.svc.commit_assignment(&mut fx.session, &w, &editor).unwrap();

        let all = fx.svc.assignments.list(&fx.session.factory_id).unwrap();
        assert_eq!(all.len(), 2);
        let active: Vec<_> = all.iter().filter(|a| a.is_active()).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);

        let old = all.iter().find(|a| a.id == first.id).unwrap();
        assert_eq!(old.status, AssignmentStatus::Inactive);
        assert!(old.valid_to.is_some());

        let current = fx.svc.active_assignment(&mut fx.session, &w.id).unwrap().unwrap();
        assert_eq!(current.machine_numbers(), vec![1, 2, 5, 6]);
    }
}
