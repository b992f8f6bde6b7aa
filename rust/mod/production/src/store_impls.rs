//! Document implementations for production models.
//!
//! Defines the collection, scope, key and hooks of each model. Collection
//! names are the storage contract shared with other tooling.

use takabook_store::Document;

use crate::model::*;

// ── Factory ──
//
// Scoped by owner so "my factories" is a prefix scan.

impl Document for Factory {
    const COLLECTION: &'static str = "factories";

    fn scope(&self) -> String {
        self.created_by.clone()
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn set_key(&mut self, id: String) {
        self.id = id;
    }
}

// ── Machine ──

impl Document for Machine {
    const COLLECTION: &'static str = "machines";

    fn scope(&self) -> String {
        self.factory_id.clone()
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn set_key(&mut self, id: String) {
        self.id = id;
    }

    fn before_create(&mut self) {
        if self.id.is_empty() {
            self.id = Machine::id_for(self.machine_number);
        }
    }
}

// ── Beam ──

impl Document for Beam {
    const COLLECTION: &'static str = "beams";

    fn scope(&self) -> String {
        self.factory_id.clone()
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn set_key(&mut self, id: String) {
        self.id = id;
    }

    fn before_create(&mut self) {
        self.is_active = true;
        self.end_date = None;
    }
}

// ── BeamTransition ──

impl Document for BeamTransition {
    const COLLECTION: &'static str = "beam_transitions";
    const CREATED_FIELD: Option<&'static str> = Some("startedAt");

    fn scope(&self) -> String {
        self.factory_id.clone()
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn set_key(&mut self, id: String) {
        self.id = id;
    }
}

// ── Worker ──

impl Document for Worker {
    const COLLECTION: &'static str = "workers";

    fn scope(&self) -> String {
        self.factory_id.clone()
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn set_key(&mut self, id: String) {
        self.id = id;
    }

    fn before_create(&mut self) {
        self.name = self.name.trim().to_string();
        self.is_active = true;
    }
}

// ── Assignment ──

impl Document for Assignment {
    const COLLECTION: &'static str = "assignments";

    fn scope(&self) -> String {
        self.factory_id.clone()
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn set_key(&mut self, id: String) {
        self.id = id;
    }
}

// ── ProductionEntry ──

impl Document for ProductionEntry {
    const COLLECTION: &'static str = "production";
    const CREATED_FIELD: Option<&'static str> = Some("recordedAt");

    fn scope(&self) -> String {
        self.factory_id.clone()
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn set_key(&mut self, id: String) {
        self.id = id;
    }

    fn before_create(&mut self) {
        self.taka_no = self.taka_no.trim().to_string();
        self.normalize();
    }

    fn before_update(&mut self) {
        self.taka_no = self.taka_no.trim().to_string();
        self.normalize();
    }
}

// ── AuditLog ──

impl Document for AuditLog {
    const COLLECTION: &'static str = "audit_logs";
    const CREATED_FIELD: Option<&'static str> = Some("performedAt");

    fn scope(&self) -> String {
        self.factory_id.clone()
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn set_key(&mut self, id: String) {
        self.id = id;
    }
}
