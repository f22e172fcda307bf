use crate::models::calendar::{Attendee, PartStat};

/// Turns a raw attendee list into display names: accepted attendees only,
/// excluded names dropped, "Last, First" flipped to "First Last". Order is
/// kept.
pub fn display_names(attendees: &[Attendee], excluded: &[String]) -> Vec<String> {
    attendees
        .iter()
        .filter(|attendee| attendee.status == PartStat::Accepted)
        .filter(|attendee| !is_excluded(&attendee.name, excluded))
        .map(|attendee| normalize_name(&attendee.name))
        .collect()
}

fn is_excluded(name: &str, excluded: &[String]) -> bool {
    excluded
        .iter()
        .filter(|pattern| !pattern.is_empty())
        .any(|pattern| name.contains(pattern.as_str()))
}

pub fn normalize_name(name: &str) -> String {
    match name.split_once(',') {
        Some((last, first)) => format!("{} {}", first.trim(), last.trim()),
        None => name.trim().to_string(),
    }
}
