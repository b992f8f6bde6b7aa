use takabook_core::ServiceError;
use takabook_store::WriteBatch;
use tracing::{info, warn};

use crate::model::{Factory, Machine};
use crate::session::Session;
use super::ProductionService;

impl ProductionService {
    // ── Factory ──

    /// Create a factory owned by the signed-in user, together with its
    /// machines `1..=machine_count`, in one batch.
    pub fn create_factory(&self, name: &str, machine_count: u32) -> Result<Factory, ServiceError> {
        let owner = self.auth.current_user()?;
        let name = name.trim();
        if name.is_empty() || machine_count == 0 {
            return Err(ServiceError::Validation("Invalid input".into()));
        }

        let mut batch = WriteBatch::new();
        let factory = batch.insert(Factory {
            id: String::new(),
            name: name.to_string(),
            machine_count,
            created_by: owner.uid.clone(),
            is_active: true,
            created_at: None,
        })?;
        for machine_number in 1..=machine_count {
            batch.insert(Machine {
                id: String::new(),
                factory_id: factory.id.clone(),
                machine_number,
                status: "idle".into(),
                is_active: true,
                created_at: None,
            })?;
        }
        batch.commit(self.kv.as_ref())?;

        info!(factory = %factory.id, owner = %owner.uid, machines = machine_count, "factory created");
        Ok(factory)
    }

    /// Active factories of the signed-in user, by name.
    pub fn list_factories(&self) -> Result<Vec<Factory>, ServiceError> {
        let owner = self.auth.current_user()?;
        let mut factories = self.factories.find(&owner.uid, |f| f.is_active)?;
        factories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(factories)
    }

    /// Select a factory and start a session on it.
    ///
    /// Beam replacements interrupted by an earlier crash are reported, not
    /// applied; `resume_beam_transitions` finishes them.
    pub fn open_session(&self, factory_id: &str) -> Result<Session, ServiceError> {
        let owner = self.auth.current_user()?;
        let factory = self
            .factories
            .get(&owner.uid, factory_id)?
            .filter(|f| f.is_active)
            .ok_or_else(|| ServiceError::NotFound(format!("factory '{factory_id}' not found")))?;

        let session = Session::new(factory.id, factory.name, owner);
        let pending = self.pending_beam_transitions(&session)?.len();
        if pending > 0 {
            warn!(factory = %session.factory_id, pending, "interrupted beam replacements found");
        }
        info!(factory = %session.factory_id, user = %session.user.uid, "session opened");
        Ok(session)
    }
}
