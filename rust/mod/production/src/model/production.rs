use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Production shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shift {
    Day,
    Night,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Night => "Night",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "night" => Some(Self::Night),
            _ => None,
        }
    }

    /// Time of day that stands for this shift when ordering entries.
    fn slot_time(shift: Option<Shift>) -> NaiveTime {
        let (h, m, s) = match shift {
            Some(Shift::Day) => (12, 0, 0),
            Some(Shift::Night) => (23, 0, 0),
            None => (0, 0, 0),
        };
        NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN)
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The business slot of a date + shift: Day is noon, Night is 23:00, no
/// shift is midnight. Ordering by slot orders entries by when the work was
/// done, independent of when it was typed in.
pub fn shift_slot(date: NaiveDate, shift: Option<Shift>) -> NaiveDateTime {
    date.and_time(Shift::slot_time(shift))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Normal,
    /// System correction: counts toward the beam, never toward a worker.
    Adjustment,
}

pub const ADJUSTMENT_WORKER_NAME: &str = "SYSTEM";
pub const ADJUSTMENT_WORKER_LABEL: &str = "Adjustment";

/// One taka logged against a machine and beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionEntry {
    pub id: String,
    pub factory_id: String,
    pub machine_id: String,
    pub machine_number: u32,
    pub beam_id: String,
    pub beam_no: String,
    /// None for adjustment rows.
    #[serde(default)]
    pub worker_id: Option<String>,
    pub worker_name: String,
    /// Label projection at write time ("Ravi 1-3 7"). May be stale.
    #[serde(default)]
    pub worker_label: String,
    #[serde(default)]
    pub shift: Option<Shift>,
    pub taka_no: String,
    pub meters: f64,
    #[serde(default)]
    pub entry_type: EntryType,
    /// Mirrors `entry_type == Normal`; kept in sync by the store hooks.
    pub count_in_worker: bool,
    /// The day the taka was produced.
    pub business_date: NaiveDate,
    /// Wall-clock time of the first write. Immutable.
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft-delete marker. Deleted entries are invisible to every read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProductionEntry {
    pub fn slot(&self) -> NaiveDateTime {
        shift_slot(self.business_date, self.shift)
    }

    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Enforce the adjustment-row rules on the worker fields.
    pub fn normalize(&mut self) {
        self.count_in_worker = self.entry_type == EntryType::Normal;
        if self.entry_type == EntryType::Adjustment {
            self.worker_id = None;
            self.worker_name = ADJUSTMENT_WORKER_NAME.to_string();
            self.worker_label = ADJUSTMENT_WORKER_LABEL.to_string();
        }
    }

    /// Label shown in worker reports.
    pub fn display_label(&self) -> &str {
        if self.worker_label.is_empty() {
            &self.worker_name
        } else {
            &self.worker_label
        }
    }
}

/// Format meters without a trailing ".0" for whole numbers.
pub fn format_meters(meters: f64) -> String {
    format!("{meters}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn slot_times() {
        assert_eq!(shift_slot(date(), Some(Shift::Day)).to_string(), "2026-03-14 12:00:00");
        assert_eq!(shift_slot(date(), Some(Shift::Night)).to_string(), "2026-03-14 23:00:00");
        assert_eq!(shift_slot(date(), None).to_string(), "2026-03-14 00:00:00");
    }

    #[test]
    fn slots_order_within_a_day() {
        let none = shift_slot(date(), None);
        let day = shift_slot(date(), Some(Shift::Day));
        let night = shift_slot(date(), Some(Shift::Night));
        let next = shift_slot(date().succ_opt().unwrap(), None);
        assert!(none < day && day < night && night < next);
    }

    #[test]
    fn shift_parsing() {
        assert_eq!(Shift::from_str("Day"), Some(Shift::Day));
        assert_eq!(Shift::from_str(" night "), Some(Shift::Night));
        assert_eq!(Shift::from_str("evening"), None);
        assert_eq!(serde_json::to_string(&Shift::Night).unwrap(), "\"Night\"");
    }

    #[test]
    fn meters_format() {
        assert_eq!(format_meters(120.0), "120");
        assert_eq!(format_meters(80.5), "80.5");
        assert_eq!(format_meters(0.0), "0");
    }
}
