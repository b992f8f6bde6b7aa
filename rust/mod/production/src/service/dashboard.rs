use std::collections::BTreeMap;

use chrono::NaiveDate;
use takabook_core::ServiceError;

use crate::model::Shift;
use crate::session::Session;
use super::report::ReportWindow;
use super::ProductionService;

/// One day's production at a glance.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total: f64,
    pub day_shift: f64,
    pub night_shift: f64,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub total: f64,
    /// Total over the number of days in the month, rounded.
    pub average_per_day: f64,
    /// `Machine N` with the most meters.
    pub top_machine: Option<String>,
    /// Name of the worker with the most credited meters.
    pub top_worker: Option<String>,
}

/// Key with the largest value; ties go to the smallest key.
fn top<K: Ord + Clone>(totals: &BTreeMap<K, f64>) -> Option<K> {
    totals
        .iter()
        .fold(None, |best: Option<(&K, f64)>, (k, v)| match best {
            Some((_, b)) if b >= *v => best,
            _ => Some((k, *v)),
        })
        .map(|(k, _)| k.clone())
}

impl ProductionService {
    // ── Dashboard ──

    pub fn day_summary(&self, session: &Session, date: NaiveDate) -> Result<DaySummary, ServiceError> {
        let report = self.load_report(session, ReportWindow::Day(date))?;
        let mut summary = DaySummary {
            date,
            total: 0.0,
            day_shift: 0.0,
            night_shift: 0.0,
            entries: report.entries().len(),
        };
        for e in report.entries() {
            summary.total += e.meters;
            match e.shift {
                Some(Shift::Day) => summary.day_shift += e.meters,
                Some(Shift::Night) => summary.night_shift += e.meters,
                None => {}
            }
        }
        Ok(summary)
    }

    pub fn month_summary(&self, session: &Session, year: i32, month: u32) -> Result<MonthSummary, ServiceError> {
        let window = ReportWindow::Month { year, month };
        let (first, last) = window.bounds()?;
        let report = self.load_report(session, window)?;

        let mut total = 0.0;
        let mut machines: BTreeMap<u32, f64> = BTreeMap::new();
        let mut workers: BTreeMap<&str, f64> = BTreeMap::new();
        for e in report.entries() {
            total += e.meters;
            *machines.entry(e.machine_number).or_default() += e.meters;
            if e.count_in_worker {
                *workers.entry(e.worker_name.as_str()).or_default() += e.meters;
            }
        }
        let days = (last - first).num_days() + 1;

        Ok(MonthSummary {
            year,
            month,
            total,
            average_per_day: (total / days as f64).round(),
            top_machine: top(&machines).map(|n| format!("Machine {n}")),
            top_worker: top(&workers).map(str::to_string),
        })
    }
}
