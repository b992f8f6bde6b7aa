use takabook_core::ServiceError;
use takabook_store::WriteBatch;
use tracing::info;

use crate::model::{AuditAction, AuditLog};
use crate::session::Session;
use super::ProductionService;

/// What a destructive operation records in the audit log.
pub struct AuditRecord<'a> {
    pub action: AuditAction,
    pub entity: &'a str,
    pub entity_id: &'a str,
    pub details: &'a str,
}

impl ProductionService {
    // ── Audit ──

    /// Run a destructive operation behind password re-confirmation.
    ///
    /// `op` stages its writes into the batch it is given; the audit record
    /// joins the same batch, so the change and its record commit together
    /// or not at all. A rejected password stops before `op` runs.
    pub fn audited<T, F>(
        &self,
        session: &Session,
        password: &str,
        record: AuditRecord<'_>,
        op: F,
    ) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut WriteBatch) -> Result<T, ServiceError>,
    {
        if password.is_empty() {
            return Err(ServiceError::PermissionDenied("Password required".into()));
        }
        self.auth.reverify(password)?;

        let mut batch = WriteBatch::new();
        let out = op(&mut batch)?;

        let performed_by = self.auth.current_user()?.uid;
        batch.insert(AuditLog {
            id: String::new(),
            factory_id: session.factory_id.clone(),
            action: record.action,
            entity: record.entity.to_string(),
            entity_id: record.entity_id.to_string(),
            details: record.details.to_string(),
            performed_by: performed_by.clone(),
            performed_at: None,
        })?;
        batch.commit(self.kv.as_ref())?;
        info!(
            factory = %session.factory_id,
            action = %record.action,
            entity_id = record.entity_id,
            by = %performed_by,
            "audited"
        );
        Ok(out)
    }

    /// The factory's audit log, newest first.
    pub fn audit_trail(&self, session: &Session) -> Result<Vec<AuditLog>, ServiceError> {
        let mut logs = self.audit_logs.list(&session.factory_id)?;
        logs.sort_by(|a, b| b.performed_at.cmp(&a.performed_at));
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Arc;

    use takabook_core::{DenyAll, ServiceError};

    use super::AuditRecord;
    use crate::model::AuditAction;
    use crate::service::testutil::{fixture, fixture_with};

    fn record() -> AuditRecord<'static> {
        AuditRecord {
            action: AuditAction::DeleteWorker,
            entity: "worker",
            entity_id: "w1",
            details: "Worker deleted",
        }
    }

    #[test]
    fn runs_op_then_appends_record() {
        let fx = fixture(1);
        let out = fx.svc.audited(&fx.session, "pw", record(), |_| Ok(42)).unwrap();
        assert_eq!(out, 42);

        let trail = fx.svc.audit_trail(&fx.session).unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, AuditAction::DeleteWorker);
        assert_eq!(trail[0].performed_by, "test-user");
        assert_eq!(trail[0].details, "Worker deleted");
        assert!(trail[0].performed_at.is_some());
    }

    #[test]
    fn empty_password_is_rejected() {
        let fx = fixture(1);
        let err = fx.svc.audited(&fx.session, "", record(), |_| Ok(())).unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(m) if m == "Password required"));
    }

    #[test]
    fn wrong_password_skips_op_and_record() {
        let fx = fixture_with(1, Arc::new(DenyAll));
        let ran = Cell::new(false);
        let err = fx
            .svc
            .audited(&fx.session, "guess", record(), |_| {
                ran.set(true);
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(m) if m == "Incorrect password"));
        assert!(!ran.get());
        assert!(fx.svc.audit_trail(&fx.session).unwrap().is_empty());
    }

    #[test]
    fn failed_op_writes_no_record() {
        let fx = fixture(1);
        let err = fx
            .svc
            .audited::<(), _>(&fx.session, "pw", record(), |_| {
                Err(ServiceError::NotFound("gone".into()))
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(fx.svc.audit_trail(&fx.session).unwrap().is_empty());
    }
}
