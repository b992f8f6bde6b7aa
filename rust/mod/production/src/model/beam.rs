use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A warp beam mounted on a machine.
///
/// `is_active` is authoritative. `end_date` is set when the beam is closed
/// and is the exclusive end of its date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beam {
    pub id: String,
    pub factory_id: String,
    pub machine_id: String,
    /// Snapshot of the machine number at write time.
    pub machine_number: u32,
    pub beam_no: String,
    pub total_meters: f64,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Beam {
    /// Whether this beam was mounted on `date`.
    ///
    /// An active beam covers every date from its start on. A closed beam
    /// covers `[start_date, end_date)`; a closed beam without an end date
    /// covers nothing.
    pub fn contains(&self, date: NaiveDate) -> bool {
        if date < self.start_date {
            return false;
        }
        if self.is_active {
            return true;
        }
        match self.end_date {
            Some(end) => date < end,
            None => false,
        }
    }
}

/// Marker written before a beam replacement is applied and removed after.
///
/// One per machine. A marker still present on a later read means the
/// replacement was interrupted; it carries everything needed to finish it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamTransition {
    /// The machine id.
    pub id: String,
    pub factory_id: String,
    pub machine_number: u32,
    /// Ids of the beams being closed.
    pub closing: Vec<String>,
    /// The beam being opened, id already assigned.
    pub opening: Beam,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn beam(start: u32, end: Option<u32>, active: bool) -> Beam {
        Beam {
            id: "b".into(),
            factory_id: "f".into(),
            machine_id: "machine_1".into(),
            machine_number: 1,
            beam_no: "B1".into(),
            total_meters: 500.0,
            start_date: day(start),
            end_date: end.map(day),
            is_active: active,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn closed_range_is_half_open() {
        let b = beam(1, Some(10), false);
        assert!(!b.contains(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()));
        assert!(b.contains(day(1)));
        assert!(b.contains(day(9)));
        assert!(!b.contains(day(10)));
    }

    #[test]
    fn active_beam_is_open_ended() {
        let b = beam(10, None, true);
        assert!(b.contains(day(10)));
        assert!(b.contains(day(31)));
        assert!(!b.contains(day(9)));
    }

    #[test]
    fn active_flag_wins_over_stale_end_date() {
        assert!(beam(1, Some(5), true).contains(day(20)));
        assert!(!beam(1, None, false).contains(day(2)));
    }
}
