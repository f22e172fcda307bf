use chrono::{DateTime, Local, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// What the indicator currently shows.
///
/// Two events are the same event when name, start and end match. The
/// participant list is left out of the comparison, so a
/// participant-only update never counts as a new event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayEvent {
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub participants: Vec<String>,
}

impl PartialEq for DisplayEvent {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.start_time == other.start_time
            && self.end_time == other.end_time
    }
}

impl Eq for DisplayEvent {}

impl DisplayEvent {
    pub fn new(
        name: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        participants: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            participants,
        }
    }

    /// Resolves `end_time` onto the day of `now`, at second 59 of the minute.
    /// An end time that does not parse resolves to `now` itself.
    pub fn end_datetime(&self, now: DateTime<Local>) -> DateTime<Local> {
        let Some(end) = parse_wall_clock(&self.end_time) else {
            return now;
        };
        let Some(end) = end.with_second(59) else {
            return now;
        };
        Local
            .from_local_datetime(&now.date_naive().and_time(end))
            .earliest()
            .unwrap_or(now)
    }

    pub fn time_range(&self) -> String {
        format!("{}-{}", self.start_time, self.end_time)
    }
}

pub fn parse_wall_clock(value: &str) -> Option<NaiveTime> {
    let (hour, minute) = value.trim().split_once(':')?;
    let hour = hour.trim().parse::<u32>().ok()?;
    let minute = minute.trim().parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

// "9:05", "14:30": hour is not zero padded.
pub fn format_wall_clock<T: Timelike>(time: &T) -> String {
    format!("{}:{:02}", time.hour(), time.minute())
}
