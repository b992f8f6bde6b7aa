use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inclusive range of machine numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRange {
    pub from: u32,
    pub to: u32,
}

impl MachineRange {
    pub fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    /// Closed-interval overlap test.
    pub fn overlaps(&self, other: &MachineRange) -> bool {
        self.from <= other.to && self.to >= other.from
    }

    pub fn machines(&self) -> impl Iterator<Item = u32> {
        self.from..=self.to
    }
}

impl std::fmt::Display for MachineRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

impl std::str::FromStr for MachineRange {
    type Err = String;

    /// Parses `7` or `1-3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid machine range '{s}'"))
        };
        match s.split_once('-') {
            Some((from, to)) => Ok(Self::new(parse(from)?, parse(to)?)),
            None => {
                let n = parse(s)?;
                Ok(Self::new(n, n))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    Inactive,
}

/// Which machines a worker runs, for a validity period.
///
/// Never edited in place: a new assignment supersedes the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub factory_id: String,
    pub worker_id: String,
    /// Snapshot of the worker name at write time.
    pub worker_name: String,
    pub ranges: Vec<MachineRange>,
    pub status: AssignmentStatus,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }

    /// Every assigned machine number, ascending. Overlapping ranges yield
    /// duplicates; they are kept.
    pub fn machine_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.ranges.iter().flat_map(|r| r.machines()).collect();
        numbers.sort();
        numbers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(ranges: Vec<MachineRange>) -> Assignment {
        Assignment {
            id: "a".into(),
            factory_id: "f".into(),
            worker_id: "w".into(),
            worker_name: "Ravi".into(),
            ranges,
            status: AssignmentStatus::Active,
            valid_from: None,
            valid_to: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn overlap_is_closed_interval() {
        let r = MachineRange::new(3, 5);
        assert!(r.overlaps(&MachineRange::new(5, 9)));
        assert!(r.overlaps(&MachineRange::new(1, 3)));
        assert!(r.overlaps(&MachineRange::new(4, 4)));
        assert!(!r.overlaps(&MachineRange::new(6, 8)));
        assert!(!r.overlaps(&MachineRange::new(1, 2)));
    }

    #[test]
    fn expands_ranges_ascending() {
        let a = assignment(vec![MachineRange::new(7, 7), MachineRange::new(1, 3)]);
        assert_eq!(a.machine_numbers(), vec![1, 2, 3, 7]);
    }

    #[test]
    fn duplicates_are_kept() {
        let a = assignment(vec![MachineRange::new(1, 2), MachineRange::new(2, 3)]);
        assert_eq!(a.machine_numbers(), vec![1, 2, 2, 3]);
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("1-3".parse::<MachineRange>().unwrap(), MachineRange::new(1, 3));
        assert_eq!(" 7 ".parse::<MachineRange>().unwrap(), MachineRange::new(7, 7));
        assert!("a-3".parse::<MachineRange>().is_err());
        assert_eq!(MachineRange::new(5, 7).to_string(), "5-7");
        assert_eq!(MachineRange::new(3, 3).to_string(), "3");
    }

    #[test]
    fn status_wire_format() {
        assert_eq!(serde_json::to_string(&AssignmentStatus::Active).unwrap(), "\"active\"");
        assert_eq!(serde_json::to_string(&AssignmentStatus::Inactive).unwrap(), "\"inactive\"");
    }
}
