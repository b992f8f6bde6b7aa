use takabook_core::{now, ServiceError};
use tracing::info;

use crate::label::format_worker_label;
use crate::model::{AssignmentStatus, AuditAction, Worker};
use crate::session::Session;
use super::audit::AuditRecord;
use super::ProductionService;

impl ProductionService {
    // ── Worker ──

    pub fn add_worker(
        &self,
        session: &Session,
        name: &str,
        phone: Option<&str>,
    ) -> Result<Worker, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("Worker name required".into()));
        }
        let worker = self.workers.insert(Worker {
            id: String::new(),
            factory_id: session.factory_id.clone(),
            name: name.trim().to_string(),
            phone: phone.map(str::trim).filter(|p| !p.is_empty()).map(String::from),
            is_active: true,
            created_at: None,
            updated_at: None,
        })?;
        info!(factory = %session.factory_id, worker = %worker.id, "worker added");
        Ok(worker)
    }

    /// Active workers, by name ignoring case.
    pub fn list_workers(&self, session: &Session) -> Result<Vec<Worker>, ServiceError> {
        let mut workers = self.workers.find(&session.factory_id, |w| w.is_active)?;
        workers.sort_by_cached_key(|w| w.name.to_lowercase());
        Ok(workers)
    }

    /// An active worker by id.
    pub fn get_worker(&self, session: &Session, worker_id: &str) -> Result<Worker, ServiceError> {
        self.workers
            .get(&session.factory_id, worker_id)?
            .filter(|w| w.is_active)
            .ok_or_else(|| ServiceError::NotFound(format!("worker '{worker_id}' not found")))
    }

    /// Display label: name plus assigned machines, or just the name when
    /// the worker has no active assignment.
    pub fn worker_label(&self, session: &mut Session, worker: &Worker) -> Result<String, ServiceError> {
        self.active_assignments(session)?;
        Ok(match session.active_assignment_for(&worker.id) {
            Some(a) => format_worker_label(&worker.name, &a.ranges),
            None => worker.name.clone(),
        })
    }

    /// Soft-delete a worker behind password re-confirmation.
    ///
    /// Entries stay; the worker's active assignment is closed in the same
    /// batch so its machines and label are released.
    pub fn delete_worker(
        &self,
        session: &mut Session,
        worker_id: &str,
        password: &str,
    ) -> Result<(), ServiceError> {
        let record = AuditRecord {
            action: AuditAction::DeleteWorker,
            entity: "worker",
            entity_id: worker_id,
            details: "Worker deleted",
        };
        self.audited(session, password, record, |batch| {
            let mut worker = self.get_worker(session, worker_id)?;
            worker.is_active = false;
            batch.save(worker)?;

            let stamp = now();
            let open = self.assignments.find(&session.factory_id, |a| {
                a.worker_id == worker_id && a.is_active()
            })?;
            let released = open.len();
            for mut assignment in open {
                assignment.status = AssignmentStatus::Inactive;
                assignment.valid_to = Some(stamp);
                batch.save(assignment)?;
            }
            info!(factory = %session.factory_id, worker = worker_id, released, "worker deleted");
            Ok(())
        })?;
        session.invalidate_assignments();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use takabook_core::{DenyAll, ServiceError};

    use crate::model::AuditAction;
    use crate::service::assignment::RangeEditor;
    use crate::service::testutil::{fixture, fixture_with};

    #[test]
    fn add_trims_and_lists_case_insensitively() {
        let fx = fixture(1);
        fx.svc.add_worker(&fx.session, "  ravi ", Some(" ")).unwrap();
        fx.svc.add_worker(&fx.session, "Asha", Some("98250 11111")).unwrap();
        fx.svc.add_worker(&fx.session, "Bhavin", None).unwrap();

        let workers = fx.svc.list_workers(&fx.session).unwrap();
        let names: Vec<&str> = workers.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Asha", "Bhavin", "ravi"]);
        assert_eq!(workers[0].phone.as_deref(), Some("98250 11111"));
        assert_eq!(workers[2].phone, None);
    }

    #[test]
    fn blank_name_is_rejected() {
        let fx = fixture(1);
        let err = fx.svc.add_worker(&fx.session, "   ", None).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == "Worker name required"));
    }

    #[test]
    fn label_uses_active_assignment() {
        let mut fx = fixture(8);
        let asha = fx.svc.add_worker(&fx.session, "Asha", None).unwrap();
        assert_eq!(fx.svc.worker_label(&mut fx.session, &asha).unwrap(), "Asha");

        let mut editor = RangeEditor::new(Vec::new());
        let machines = fx.svc.factory_machines(&mut fx.session).unwrap().to_vec();
        editor.add_range(&machines, 3, 3).unwrap();
        editor.add_range(&machines, 5, 7).unwrap();
        fx.svc.commit_assignment(&mut fx.session, &asha, &editor).unwrap();

        assert_eq!(fx.svc.worker_label(&mut fx.session, &asha).unwrap(), "Asha 3 5-7");
        assert_eq!(
            fx.svc.worker_labels(&mut fx.session).unwrap()[&asha.id],
            "Asha 3 5-7"
        );
    }

    #[test]
    fn delete_is_soft_and_audited() {
        let mut fx = fixture(1);
        let w = fx.svc.add_worker(&fx.session, "Ravi", None).unwrap();
        fx.svc.delete_worker(&mut fx.session, &w.id, "pw").unwrap();

        assert!(fx.svc.list_workers(&fx.session).unwrap().is_empty());
        assert!(matches!(
            fx.svc.get_worker(&fx.session, &w.id),
            Err(ServiceError::NotFound(_))
        ));
        let stored = fx.svc.workers.get(&fx.session.factory_id, &w.id).unwrap().unwrap();
        assert!(!stored.is_active);

        let trail = fx.svc.audit_trail(&fx.session).unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, AuditAction::DeleteWorker);
        assert_eq!(trail[0].entity, "worker");
        assert_eq!(trail[0].entity_id, w.id);
    }

    #[test]
    fn delete_releases_active_assignment() {
        let mut fx = fixture(4);
        let ravi = fx.svc.add_worker(&fx.session, "Ravi", None).unwrap();
        let mut editor = RangeEditor::new(Vec::new());
        let machines = fx.svc.factory_machines(&mut fx.session).unwrap().to_vec();
        editor.add_range(&machines, 1, 2).unwrap();
        fx.svc.commit_assignment(&mut fx.session, &ravi, &editor).unwrap();
        assert!(fx.svc.worker_labels(&mut fx.session).unwrap().contains_key(&ravi.id));

        fx.svc.delete_worker(&mut fx.session, &ravi.id, "pw").unwrap();

        assert!(fx.svc.worker_labels(&mut fx.session).unwrap().is_empty());
        assert!(fx.svc.active_assignment(&mut fx.session, &ravi.id).unwrap().is_none());
    }

    #[test]
    fn wrong_password_keeps_worker() {
        let mut fx = fixture_with(1, Arc::new(DenyAll));
        let w = fx.svc.add_worker(&fx.session, "Ravi", None).unwrap();
        assert!(fx.svc.delete_worker(&mut fx.session, &w.id, "nope").is_err());
        assert_eq!(fx.svc.list_workers(&fx.session).unwrap().len(), 1);
        assert!(fx.svc.audit_trail(&fx.session).unwrap().is_empty());
    }
}
