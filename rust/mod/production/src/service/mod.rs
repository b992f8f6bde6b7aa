pub mod assignment;
pub mod audit;
pub mod beam;
pub mod bulk;
pub mod dashboard;
pub mod entry;
pub mod factory;
pub mod report;
pub mod worker;

use std::collections::BTreeMap;
use std::sync::Arc;

use takabook_core::{Authenticator, ServiceConfig, ServiceError};
use takabook_kv::{KVStore, RedbStore};
use takabook_store::Collection;
use tracing::debug;

use crate::model::*;
use crate::session::Session;

/// Production service. Holds the store and the authenticator and provides
/// every business operation.
pub struct ProductionService {
    pub(crate) kv: Arc<dyn KVStore>,
    pub(crate) auth: Arc<dyn Authenticator>,
    pub(crate) factories: Collection<Factory>,
    pub(crate) machines: Collection<Machine>,
    pub(crate) beams: Collection<Beam>,
    pub(crate) transitions: Collection<BeamTransition>,
    pub(crate) workers: Collection<Worker>,
    pub(crate) assignments: Collection<Assignment>,
    pub(crate) production: Collection<ProductionEntry>,
    pub(crate) audit_logs: Collection<AuditLog>,
}

impl ProductionService {
    pub fn new(kv: Arc<dyn KVStore>, auth: Arc<dyn Authenticator>) -> Self {
        Self {
            factories: Collection::new(Arc::clone(&kv)),
            machines: Collection::new(Arc::clone(&kv)),
            beams: Collection::new(Arc::clone(&kv)),
            transitions: Collection::new(Arc::clone(&kv)),
            workers: Collection::new(Arc::clone(&kv)),
            assignments: Collection::new(Arc::clone(&kv)),
            production: Collection::new(Arc::clone(&kv)),
            audit_logs: Collection::new(Arc::clone(&kv)),
            kv,
            auth,
        }
    }

    /// Open the redb store named by `config` and build the service on it.
    pub fn open(config: &ServiceConfig, auth: Arc<dyn Authenticator>) -> Result<Self, ServiceError> {
        let path = config.resolve_db_path();
        let store = RedbStore::open(&path)
            .map_err(|e| ServiceError::Storage(format!("open {}: {e}", path.display())))?;
        Ok(Self::new(Arc::new(store), auth))
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.auth.as_ref()
    }

    // ── Session caches ──

    /// The factory's machines, ascending by number.
    pub fn factory_machines<'s>(&self, session: &'s mut Session) -> Result<&'s [Machine], ServiceError> {
        if session.machines.is_none() {
            let mut machines = self.machines.list(&session.factory_id)?;
            machines.sort_by_key(|m| m.machine_number);
            debug!(factory = %session.factory_id, count = machines.len(), "machine cache filled");
            session.machines = Some(machines);
        }
        Ok(session.machines.as_deref().unwrap_or_default())
    }

    /// Every beam of the factory, active or not.
    pub fn factory_beams<'s>(&self, session: &'s mut Session) -> Result<&'s [Beam], ServiceError> {
        if session.beams.is_none() {
            let beams = self.beams.list(&session.factory_id)?;
            debug!(factory = %session.factory_id, count = beams.len(), "beam cache filled");
            session.beams = Some(beams);
        }
        Ok(session.beams.as_deref().unwrap_or_default())
    }

    /// The factory's active assignments.
    pub fn active_assignments<'s>(&self, session: &'s mut Session) -> Result<&'s [Assignment], ServiceError> {
        if session.assignments.is_none() {
            let assignments = self
                .assignments
                .find(&session.factory_id, |a| a.is_active())?;
            debug!(factory = %session.factory_id, count = assignments.len(), "assignment cache filled");
            session.assignments = Some(assignments);
        }
        Ok(session.assignments.as_deref().unwrap_or_default())
    }

    /// Worker id → display label, from the active assignments.
    pub fn worker_labels(&self, session: &mut Session) -> Result<BTreeMap<String, String>, ServiceError> {
        self.active_assignments(session)?;
        Ok(session.label_projection())
    }

    pub(crate) fn find_machine(
        &self,
        session: &mut Session,
        machine_number: u32,
    ) -> Result<Option<Machine>, ServiceError> {
        Ok(self
            .factory_machines(session)?
            .iter()
            .find(|m| m.machine_number == machine_number)
            .cloned())
    }

    /// Live (not deleted) production entries of the session's factory that
    /// satisfy `pred`.
    pub(crate) fn live_entries<F>(&self, session: &Session, pred: F) -> Result<Vec<ProductionEntry>, ServiceError>
    where
        F: Fn(&ProductionEntry) -> bool,
    {
        self.production
            .find(&session.factory_id, |e| e.is_live() && pred(e))
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use takabook_core::{AllowAll, Authenticator};
    use takabook_kv::{KVStore, RedbStore};

    use super::ProductionService;
    use crate::session::Session;

    pub(crate) struct Fixture {
        pub svc: ProductionService,
        pub session: Session,
        _dir: tempfile::TempDir,
    }

    pub(crate) fn fixture_with(machine_count: u32, auth: Arc<dyn Authenticator>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KVStore> = Arc::new(RedbStore::open(&dir.path().join("t.redb")).unwrap());
        let svc = ProductionService::new(kv, auth);
        let factory = svc.create_factory("Surat Mill", machine_count).unwrap();
        let session = svc.open_session(&factory.id).unwrap();
        Fixture {
            svc,
            session,
            _dir: dir,
        }
    }

    pub(crate) fn fixture(machine_count: u32) -> Fixture {
        fixture_with(machine_count, Arc::new(AllowAll))
    }

    pub(crate) fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }
}
