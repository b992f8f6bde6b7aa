//! End-to-end flows through the public service API on a real redb file.

use std::sync::Arc;

use chrono::NaiveDate;
use takabook_core::{
    hash_password, AllowAll, Authenticator, PasswordAuthenticator, Principal, ServiceError,
};
use takabook_kv::{KVError, KVStore, RedbStore};
use takabook_production::model::{Beam, BeamTransition, MachineRange, Shift};
use takabook_production::service::assignment::RangeEditor;
use takabook_production::service::beam::NewBeam;
use takabook_production::service::bulk::GridMode;
use takabook_production::service::entry::NewEntry;
use takabook_production::service::report::{ReportKind, ReportWindow};
use takabook_production::{ProductionService, Session};
use takabook_store::Collection;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

struct Mill {
    svc: ProductionService,
    session: Session,
    kv: Arc<dyn KVStore>,
    _dir: tempfile::TempDir,
}

fn mill(machines: u32, auth: Arc<dyn Authenticator>) -> Mill {
    let dir = tempfile::tempdir().unwrap();
    let kv: Arc<dyn KVStore> = Arc::new(RedbStore::open(&dir.path().join("mill.redb")).unwrap());
    let svc = ProductionService::new(Arc::clone(&kv), auth);
    let factory = svc.create_factory("Surat Mill", machines).unwrap();
    let session = svc.open_session(&factory.id).unwrap();
    Mill {
        svc,
        session,
        kv,
        _dir: dir,
    }
}

fn mount(m: &mut Mill, machine_number: u32, beam_no: &str, total: f64, start: u32) -> Beam {
    m.svc
        .add_beam(
            &mut m.session,
            NewBeam {
                machine_number,
                beam_no: beam_no.into(),
                total_meters: total,
                start_date: day(start),
            },
        )
        .unwrap()
}

fn log(m: &mut Mill, machine_number: u32, worker_id: &str, shift: Shift, taka: &str, meters: f64, d: u32) {
    m.svc
        .record_entry(
            &mut m.session,
            NewEntry {
                machine_number,
                worker_id: worker_id.into(),
                shift,
                taka_no: taka.into(),
                meters,
                business_date: day(d),
            },
        )
        .unwrap();
}

#[test]
fn beam_shortage_and_replacement() {
    let mut m = mill(4, Arc::new(AllowAll));
    let ravi = m.svc.add_worker(&m.session, "Ravi", None).unwrap();
    let b1 = mount(&mut m, 4, "B1", 500.0, 1);

    log(&mut m, 4, &ravi.id, Shift::Day, "1", 120.0, 2);
    log(&mut m, 4, &ravi.id, Shift::Night, "2", 80.0, 2);

    let stats = m.svc.beam_stats(&m.session, &b1).unwrap();
    assert_eq!(stats.produced, 200.0);
    assert_eq!(stats.bhidan, 300.0);
    assert_eq!(format!("{:.2}", stats.shortage_percent), "60.00");

    let b2 = mount(&mut m, 4, "B2", 450.0, 10);
    let closed: Vec<Beam> = m.svc.beams_by_status(&m.session, false).unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].id, b1.id);
    assert_eq!(closed[0].end_date, Some(day(10)));
    let active = m.svc.active_beam(&m.session, 4).unwrap().unwrap();
    assert_eq!(active.id, b2.id);
    assert!(active.is_active);
    assert_eq!(active.end_date, None);

    let on_5 = m.svc.resolve_beam(&mut m.session, 4, day(5)).unwrap().unwrap();
    let on_15 = m.svc.resolve_beam(&mut m.session, 4, day(15)).unwrap().unwrap();
    assert_eq!(on_5.beam_no, "B1");
    assert_eq!(on_15.beam_no, "B2");

    // Closed beams keep their figures in the beam report.
    let report = m.svc.load_report(&m.session, ReportWindow::month_of(day(1))).unwrap();
    let table = m.svc.report_table(&m.session, &report, ReportKind::Beam, false).unwrap();
    assert_eq!(table.rows, vec![vec!["B1", "Machine 4", "500", "200", "300", "60.00", "OK"]]);
}

#[test]
fn grid_rows_follow_ranges_with_last_taka() {
    let mut m = mill(8, Arc::new(AllowAll));
    for n in [1, 2, 3, 7] {
        mount(&mut m, n, &format!("B{n}"), 1000.0, 1);
    }
    let asha = m.svc.add_worker(&m.session, "Asha", None).unwrap();
    let ravi = m.svc.add_worker(&m.session, "Ravi", None).unwrap();

    log(&mut m, 1, &asha.id, Shift::Night, "101", 60.0, 4);
    log(&mut m, 7, &asha.id, Shift::Day, "T-55", 60.0, 4);
    // Same slot and later slot: neither counts as "before".
    log(&mut m, 3, &asha.id, Shift::Day, "555", 60.0, 5);
    log(&mut m, 2, &asha.id, Shift::Night, "999", 60.0, 5);

    let mut editor = m.svc.range_editor(&mut m.session, &ravi).unwrap();
    let machines = m.svc.factory_machines(&mut m.session).unwrap().to_vec();
    editor.add_range(&machines, 1, 3).unwrap();
    editor.add_range(&machines, 7, 7).unwrap();
    m.svc.commit_assignment(&mut m.session, &ravi, &editor).unwrap();

    let grid = m
        .svc
        .load_bulk_grid(&mut m.session, &ravi.id, day(5), Shift::Day)
        .unwrap();
    assert_eq!(grid.mode, GridMode::Create);
    assert_eq!(grid.worker_label, "Ravi 1-3 7");
    let rows: Vec<(u32, &str)> = grid
        .rows()
        .iter()
        .map(|r| (r.machine_number, r.taka_no.as_str()))
        .collect();
    assert_eq!(rows, vec![(1, "101"), (2, ""), (3, ""), (7, "T-55")]);
}

#[test]
fn wrong_password_writes_nothing() {
    let hash = hash_password("loom-secret").unwrap();
    let operator = Principal {
        uid: "op-1".into(),
        email: "op@mill.in".into(),
    };
    let auth = Arc::new(PasswordAuthenticator::new(operator, hash));
    let mut m = mill(1, auth);
    let ravi = m.svc.add_worker(&m.session, "Ravi", None).unwrap();
    mount(&mut m, 1, "B1", 500.0, 1);
    log(&mut m, 1, &ravi.id, Shift::Day, "1", 50.0, 3);
    let entry = m.svc.entries_on(&m.session, day(3)).unwrap().remove(0);

    let err = m.svc.delete_entry(&m.session, &entry.id, "guess").unwrap_err();
    assert!(matches!(err, ServiceError::PermissionDenied(msg) if msg == "Incorrect password"));
    assert_eq!(m.svc.entries_on(&m.session, day(3)).unwrap().len(), 1);
    assert!(m.svc.audit_trail(&m.session).unwrap().is_empty());

    m.svc.delete_entry(&m.session, &entry.id, "loom-secret").unwrap();
    assert!(m.svc.entries_on(&m.session, day(3)).unwrap().is_empty());
    let trail = m.svc.audit_trail(&m.session).unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].performed_by, "op-1");
}

/// A store whose audit log cannot be written.
struct AuditLogDown(RedbStore);

impl AuditLogDown {
    fn check(key: &str) -> Result<(), KVError> {
        if key.starts_with("audit_logs:") {
            return Err(KVError::Storage("audit log unavailable".into()));
        }
        Ok(())
    }
}

impl KVStore for AuditLogDown {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        self.0.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        Self::check(key)?;
        self.0.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        self.0.delete(key)
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError> {
        for (key, _) in entries {
            Self::check(key)?;
        }
        self.0.batch_set(entries)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        self.0.scan(prefix)
    }
}

#[test]
fn failed_audit_write_keeps_entry_and_worker() {
    let dir = tempfile::tempdir().unwrap();
    let redb = RedbStore::open(&dir.path().join("mill.redb")).unwrap();
    let kv: Arc<dyn KVStore> = Arc::new(AuditLogDown(redb));
    let svc = ProductionService::new(Arc::clone(&kv), Arc::new(AllowAll));
    let factory = svc.create_factory("Surat Mill", 2).unwrap();
    let session = svc.open_session(&factory.id).unwrap();
    let mut m = Mill {
        svc,
        session,
        kv,
        _dir: dir,
    };

    let ravi = m.svc.add_worker(&m.session, "Ravi", None).unwrap();
    mount(&mut m, 1, "B1", 500.0, 1);
    log(&mut m, 1, &ravi.id, Shift::Day, "1", 50.0, 3);
    let entry = m.svc.entries_on(&m.session, day(3)).unwrap().remove(0);

    let err = m.svc.delete_entry(&m.session, &entry.id, "pw").unwrap_err();
    assert!(matches!(err, ServiceError::Storage(_)));
    assert_eq!(m.svc.entries_on(&m.session, day(3)).unwrap().len(), 1);

    let err = m.svc.delete_worker(&mut m.session, &ravi.id, "pw").unwrap_err();
    assert!(matches!(err, ServiceError::Storage(_)));
    assert_eq!(m.svc.list_workers(&m.session).unwrap().len(), 1);
    assert!(m.svc.audit_trail(&m.session).unwrap().is_empty());
}

#[test]
fn interrupted_replacement_is_resumable() {
    let mut m = mill(2, Arc::new(AllowAll));
    let b1 = mount(&mut m, 2, "B1", 500.0, 1);

    // A crash after the marker was written but before the batch ran.
    let mut opening = b1.clone();
    opening.id = "b2-pending".into();
    opening.beam_no = "B2".into();
    opening.start_date = day(12);
    Collection::<BeamTransition>::new(Arc::clone(&m.kv))
        .insert(BeamTransition {
            id: b1.machine_id.clone(),
            factory_id: m.session.factory_id.clone(),
            machine_number: 2,
            closing: vec![b1.id.clone()],
            opening,
            started_at: None,
        })
        .unwrap();
    assert_eq!(m.svc.pending_beam_transitions(&m.session).unwrap().len(), 1);

    // Until resumed, the old beam is still the consistent active one.
    let mut session = m.svc.open_session(&m.session.factory_id).unwrap();
    assert_eq!(m.svc.active_beam(&session, 2).unwrap().unwrap().id, b1.id);

    assert_eq!(m.svc.resume_beam_transitions(&mut session).unwrap(), 1);
    assert!(m.svc.pending_beam_transitions(&session).unwrap().is_empty());
    let active = m.svc.active_beam(&session, 2).unwrap().unwrap();
    assert_eq!(active.beam_no, "B2");
    assert!(m.svc.beam_conflicts(&session).unwrap().is_empty());
}

#[test]
fn factory_owns_exactly_its_machines() {
    let mut m = mill(12, Arc::new(AllowAll));
    let machines = m.svc.factory_machines(&mut m.session).unwrap();
    assert_eq!(machines.len(), 12);
    assert_eq!(machines.last().unwrap().machine_number, 12);

    // A second factory is a separate tenant.
    let other = m.svc.create_factory("Navsari", 2).unwrap();
    let mut other_session = m.svc.open_session(&other.id).unwrap();
    assert_eq!(m.svc.factory_machines(&mut other_session).unwrap().len(), 2);
    assert!(m.svc.list_workers(&other_session).unwrap().is_empty());
}

#[test]
fn ranges_must_exist_and_not_overlap() {
    let mut m = mill(5, Arc::new(AllowAll));
    let ravi = m.svc.add_worker(&m.session, "Ravi", None).unwrap();
    let machines = m.svc.factory_machines(&mut m.session).unwrap().to_vec();
    let mut editor = RangeEditor::default();
    editor.add_range(&machines, 1, 2).unwrap();
    assert!(editor.add_range(&machines, 4, 6).is_err());
    assert!(editor.add_range(&machines, 2, 3).is_err());
    editor.add_range(&machines, 3, 5).unwrap();
    let a = m.svc.commit_assignment(&mut m.session, &ravi, &editor).unwrap();
    assert_eq!(a.ranges, vec![MachineRange::new(1, 2), MachineRange::new(3, 5)]);
}
