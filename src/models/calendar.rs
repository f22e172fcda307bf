use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartStat {
    Accepted,
    Declined,
    Tentative,
    NeedsAction,
    Delegated,
    Other(String),
}

impl PartStat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACCEPTED" => PartStat::Accepted,
            "DECLINED" => PartStat::Declined,
            "TENTATIVE" => PartStat::Tentative,
            "NEEDS-ACTION" => PartStat::NeedsAction,
            "DELEGATED" => PartStat::Delegated,
            other => PartStat::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub name: String,
    pub status: PartStat,
}

impl Attendee {
    pub fn new(name: impl Into<String>, status: PartStat) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// One item returned by the calendar server. Start and end are local wall
/// clock; either may be missing when the server sends something we could
/// not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarItem {
    pub title: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub attendees: Vec<Attendee>,
}
