//! Per-operator working context.
//!
//! A `Session` holds the selected factory, the signed-in user and the
//! read caches (machines, beams, active assignments) that several
//! operations share. Caches are filled on first use by the service and
//! dropped by the writes that change the underlying data; nothing is
//! cached across sessions.

use std::collections::BTreeMap;

use takabook_core::Principal;

use crate::label::format_worker_label;
use crate::model::{Assignment, Beam, Machine};

#[derive(Debug, Clone)]
pub struct Session {
    pub factory_id: String,
    pub factory_name: String,
    pub user: Principal,
    pub(crate) machines: Option<Vec<Machine>>,
    pub(crate) beams: Option<Vec<Beam>>,
    pub(crate) assignments: Option<Vec<Assignment>>,
}

impl Session {
    pub fn new(factory_id: impl Into<String>, factory_name: impl Into<String>, user: Principal) -> Self {
        Self {
            factory_id: factory_id.into(),
            factory_name: factory_name.into(),
            user,
            machines: None,
            beams: None,
            assignments: None,
        }
    }

    /// Drop the beam cache. Called after any beam write.
    pub fn invalidate_beams(&mut self) {
        self.beams = None;
    }

    /// Drop the active-assignment cache (and with it the label projection).
    pub fn invalidate_assignments(&mut self) {
        self.assignments = None;
    }

    pub(crate) fn active_assignment_for(&self, worker_id: &str) -> Option<&Assignment> {
        self.assignments
            .as_ref()?
            .iter()
            .find(|a| a.worker_id == worker_id)
    }

    /// Label projection of the cached active assignments: worker id → label.
    ///
    /// Labels use the worker name snapshot stored on the assignment, so a
    /// renamed worker keeps the old name until re-assigned.
    pub(crate) fn label_projection(&self) -> BTreeMap<String, String> {
        self.assignments
            .iter()
            .flatten()
            .map(|a| (a.worker_id.clone(), format_worker_label(&a.worker_name, &a.ranges)))
            .collect()
    }
}
