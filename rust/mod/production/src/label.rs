//! Worker display labels: the name followed by the assigned machines,
//! e.g. `Asha 3 5-7`.

use crate::model::MachineRange;

pub fn format_worker_label(worker_name: &str, ranges: &[MachineRange]) -> String {
    if ranges.is_empty() {
        return worker_name.to_string();
    }
    let parts: Vec<String> = ranges.iter().map(|r| r.to_string()).collect();
    format!("{} {}", worker_name, parts.join(" "))
}
