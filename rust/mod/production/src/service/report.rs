//! Production reports.
//!
//! [`ProductionService::load_report`] fetches the window's live entries
//! once; every pivot is computed from that one fetch. Each pivot renders to
//! a [`ReportTable`], which is what both the screen and the CSV export use.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Months, NaiveDate};
use takabook_core::ServiceError;
use tracing::{debug, info};

use crate::model::{format_meters, Beam, ProductionEntry, Shift};
use crate::session::Session;
use super::beam::BeamStats;
use super::ProductionService;

/// The period a report covers. All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportWindow {
    Day(NaiveDate),
    Range { from: NaiveDate, to: NaiveDate },
    Month { year: i32, month: u32 },
}

impl ReportWindow {
    /// First and last day of the window.
    pub fn bounds(&self) -> Result<(NaiveDate, NaiveDate), ServiceError> {
        let invalid = || ServiceError::Validation("Please select a valid time period".into());
        match *self {
            Self::Day(day) => Ok((day, day)),
            Self::Range { from, to } if from <= to => Ok((from, to)),
            Self::Range { .. } => Err(invalid()),
            Self::Month { year, month } => {
                let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .ok_or_else(invalid)?;
                Ok((first, last))
            }
        }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        Self::Month {
            year: date.year(),
            month: date.month(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Worker,
    Machine,
    Shift,
    Taka,
    Beam,
}

impl ReportKind {
    pub const ALL: [ReportKind; 5] = [Self::Worker, Self::Machine, Self::Shift, Self::Taka, Self::Beam];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Machine => "machine",
            Self::Shift => "shift",
            Self::Taka => "taka",
            Self::Beam => "beam",
        }
    }

    /// Export file name, e.g. `worker_report.csv`.
    pub fn file_name(&self) -> String {
        format!("{}_report.csv", self.as_str())
    }
}

impl std::str::FromStr for ReportKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ServiceError::Validation(format!("unknown report '{s}'")))
    }
}

/// A rendered pivot: header row plus data rows, all as display strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), ServiceError> {
        let csv_err = |e: csv::Error| ServiceError::Internal(format!("write csv: {e}"));
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(&self.headers).map_err(csv_err)?;
        for row in &self.rows {
            wtr.write_record(row).map_err(csv_err)?;
        }
        wtr.flush()
            .map_err(|e| ServiceError::Internal(format!("write csv: {e}")))
    }

    /// Write the table to `dir/{kind}_report.csv`, creating `dir` if needed.
    pub fn export(&self, dir: &Path, kind: ReportKind) -> Result<PathBuf, ServiceError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| ServiceError::Internal(format!("create {}: {e}", dir.display())))?;
        let path = dir.join(kind.file_name());
        let file = std::fs::File::create(&path)
            .map_err(|e| ServiceError::Internal(format!("create {}: {e}", path.display())))?;
        self.write_csv(file)?;
        info!(path = %path.display(), rows = self.rows.len(), "report exported");
        Ok(path)
    }
}

/// Meters summed under one key.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalRow {
    pub key: String,
    pub meters: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeamRow {
    pub beam_no: String,
    pub machine_number: u32,
    pub total_meters: f64,
    pub stats: BeamStats,
}

/// The live entries of one window.
#[derive(Debug, Clone)]
pub struct Report {
    pub from: NaiveDate,
    pub to: NaiveDate,
    entries: Vec<ProductionEntry>,
}

impl Report {
    pub fn new(from: NaiveDate, to: NaiveDate, entries: Vec<ProductionEntry>) -> Self {
        Self { from, to, entries }
    }

    pub fn entries(&self) -> &[ProductionEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn worker_rows(&self) -> impl Iterator<Item = &ProductionEntry> {
        self.entries.iter().filter(|e| e.count_in_worker)
    }

    /// Worker-credited meters per label, by label ignoring case.
    pub fn by_worker(&self) -> Vec<TotalRow> {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for e in self.worker_rows() {
            *totals.entry(e.display_label()).or_default() += e.meters;
        }
        let mut rows: Vec<TotalRow> = totals
            .into_iter()
            .map(|(key, meters)| TotalRow {
                key: key.to_string(),
                meters,
            })
            .collect();
        rows.sort_by_cached_key(|r| r.key.to_lowercase());
        rows
    }

    /// All meters per machine, ascending by machine number.
    pub fn by_machine(&self) -> Vec<TotalRow> {
        let mut totals: BTreeMap<u32, f64> = BTreeMap::new();
        for e in &self.entries {
            *totals.entry(e.machine_number).or_default() += e.meters;
        }
        totals
            .into_iter()
            .map(|(n, meters)| TotalRow {
                key: format!("Machine {n}"),
                meters,
            })
            .collect()
    }

    /// Worker-credited meters per shift: Day, Night, then entries without
    /// a shift.
    pub fn by_shift(&self) -> Vec<TotalRow> {
        let order = |s: Option<Shift>| match s {
            Some(Shift::Day) => 0,
            Some(Shift::Night) => 1,
            None => 2,
        };
        let mut totals: BTreeMap<u8, (Option<Shift>, f64)> = BTreeMap::new();
        for e in self.worker_rows() {
            totals.entry(order(e.shift)).or_insert((e.shift, 0.0)).1 += e.meters;
        }
        totals
            .into_values()
            .map(|(shift, meters)| TotalRow {
                key: shift.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
                meters,
            })
            .collect()
    }

    /// Worker-credited meters per taka number, in natural order.
    pub fn by_taka(&self) -> Vec<TotalRow> {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for e in self.worker_rows() {
            *totals.entry(e.taka_no.as_str()).or_default() += e.meters;
        }
        let mut rows: Vec<TotalRow> = totals
            .into_iter()
            .map(|(key, meters)| TotalRow {
                key: key.to_string(),
                meters,
            })
            .collect();
        rows.sort_by(|a, b| natural_cmp(&a.key, &b.key));
        rows
    }

    /// Shortage per beam. Produced meters come from every entry in the
    /// window, adjustments included. Natural order by beam number.
    pub fn by_beam(&self, beams: &[Beam]) -> Vec<BeamRow> {
        let mut produced: BTreeMap<&str, f64> = BTreeMap::new();
        for e in &self.entries {
            *produced.entry(e.beam_id.as_str()).or_default() += e.meters;
        }
        let mut rows: Vec<BeamRow> = beams
            .iter()
            .map(|b| BeamRow {
                beam_no: b.beam_no.clone(),
                machine_number: b.machine_number,
                total_meters: b.total_meters,
                stats: BeamStats::compute(
                    b.total_meters,
                    produced.get(b.id.as_str()).copied().unwrap_or(0.0),
                ),
            })
            .collect();
        rows.sort_by(|a, b| natural_cmp(&a.beam_no, &b.beam_no));
        rows
    }

    pub fn total_table(kind: ReportKind, rows: &[TotalRow]) -> ReportTable {
        let first = match kind {
            ReportKind::Worker => "Worker",
            ReportKind::Machine => "Machine",
            ReportKind::Shift => "Shift",
            ReportKind::Taka | ReportKind::Beam => "Taka No",
        };
        let mut table = ReportTable::new(&[first, "Total Meters"]);
        table.rows = rows
            .iter()
            .map(|r| vec![r.key.clone(), format_meters(r.meters)])
            .collect();
        table
    }

    pub fn beam_table(rows: &[BeamRow]) -> ReportTable {
        let mut table = ReportTable::new(&[
            "Beam No",
            "Machine",
            "Total Meters",
            "Produced",
            "Bhidan",
            "Shortage %",
            "Status",
        ]);
        table.rows = rows
            .iter()
            .map(|r| {
                vec![
                    r.beam_no.clone(),
                    format!("Machine {}", r.machine_number),
                    format_meters(r.total_meters),
                    format_meters(r.stats.produced),
                    format_meters(r.stats.bhidan),
                    format!("{:.2}", r.stats.shortage_percent),
                    r.stats.status().to_string(),
                ]
            })
            .collect();
        table
    }
}

/// Compare strings with digit runs taken as numbers: `T2 < T10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut xs, mut ys) = (a.chars().peekable(), b.chars().peekable());
    loop {
        match (xs.peek().copied(), ys.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let n = take_digits(&mut xs);
                let m = take_digits(&mut ys);
                let ord = n
                    .trim_start_matches('0')
                    .len()
                    .cmp(&m.trim_start_matches('0').len())
                    .then_with(|| n.trim_start_matches('0').cmp(m.trim_start_matches('0')));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                xs.next();
                ys.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        digits.push(c);
    }
    digits
}

impl ProductionService {
    // ── Reports ──

    /// Fetch the window's live entries.
    pub fn load_report(&self, session: &Session, window: ReportWindow) -> Result<Report, ServiceError> {
        let (from, to) = window.bounds()?;
        let entries = self.live_entries(session, |e| e.business_date >= from && e.business_date <= to)?;
        debug!(factory = %session.factory_id, %from, %to, rows = entries.len(), "report loaded");
        Ok(Report::new(from, to, entries))
    }

    /// Render one pivot of a loaded report. `active_beams` picks active or
    /// closed beams for the beam pivot and is ignored otherwise.
    pub fn report_table(
        &self,
        session: &Session,
        report: &Report,
        kind: ReportKind,
        active_beams: bool,
    ) -> Result<ReportTable, ServiceError> {
        Ok(match kind {
            ReportKind::Worker => Report::total_table(kind, &report.by_worker()),
            ReportKind::Machine => Report::total_table(kind, &report.by_machine()),
            ReportKind::Shift => Report::total_table(kind, &report.by_shift()),
            ReportKind::Taka => Report::total_table(kind, &report.by_taka()),
            ReportKind::Beam => {
                let beams = self.beams_by_status(session, active_beams)?;
                Report::beam_table(&report.by_beam(&beams))
            }
        })
    }
}
