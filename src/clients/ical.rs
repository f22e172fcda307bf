use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use tracing::warn;

use crate::models::calendar::{Attendee, CalendarItem, PartStat};

#[derive(Debug, PartialEq, Eq)]
struct Property<'a> {
    name: String,
    params: Vec<(String, String)>,
    value: &'a str,
}

impl Property<'_> {
    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

/// Reads every VEVENT in an iCalendar document, in document order.
///
/// Only what the indicator needs is extracted. Nested components such as
/// VALARM are skipped.
pub fn parse_events(ics: &str) -> Vec<CalendarItem> {
    let mut items = Vec::new();
    let mut current: Option<CalendarItem> = None;
    let mut nested = 0usize;

    for line in unfold(ics) {
        let Some(property) = parse_property(&line) else {
            continue;
        };
        match (property.name.as_str(), property.value.to_ascii_uppercase().as_str()) {
            ("BEGIN", "VEVENT") if current.is_none() => {
                current = Some(CalendarItem {
                    title: String::new(),
                    start: None,
                    end: None,
                    attendees: Vec::new(),
                });
                continue;
            }
            ("END", "VEVENT") if nested == 0 => {
                if let Some(item) = current.take() {
                    items.push(item);
                }
                continue;
            }
            ("BEGIN", _) if current.is_some() => {
                nested += 1;
                continue;
            }
            ("END", _) if current.is_some() && nested > 0 => {
                nested -= 1;
                continue;
            }
            _ => {}
        }

        let Some(item) = current.as_mut() else {
            continue;
        };
        if nested > 0 {
            continue;
        }

        match property.name.as_str() {
            "SUMMARY" => item.title = unescape_text(property.value),
            "DTSTART" => item.start = parse_date_time(&property),
            "DTEND" => item.end = parse_date_time(&property),
            "ATTENDEE" => item.attendees.push(parse_attendee(&property)),
            _ => {}
        }
    }

    if current.is_some() {
        warn!("calendar data ended inside a VEVENT");
    }
    items
}

fn unfold(ics: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in ics.lines() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(continuation) = raw.strip_prefix([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.push_str(continuation);
                continue;
            }
        }
        if !raw.is_empty() {
            lines.push(raw.to_string());
        }
    }
    lines
}

fn parse_property(line: &str) -> Option<Property<'_>> {
    let mut in_quotes = false;
    let mut split_at = None;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                split_at = Some(idx);
                break;
            }
            _ => {}
        }
    }
    let split_at = split_at?;
    let (head, value) = (&line[..split_at], &line[split_at + 1..]);

    let mut segments = split_unquoted(head, ';').into_iter();
    let name = segments.next()?.trim().to_ascii_uppercase();
    let params = segments
        .filter_map(|segment| {
            let (key, value) = segment.split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((key.trim().to_ascii_uppercase(), value.to_string()))
        })
        .collect();

    Some(Property { name, params, value })
}

fn split_unquoted(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == separator && !in_quotes {
            parts.push(&input[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push(' '),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out.trim().to_string()
}

/// UTC values are converted to local wall clock; floating and TZID values
/// are taken as local already. DATE values start at midnight.
fn parse_date_time(property: &Property<'_>) -> Option<NaiveDateTime> {
    let value = property.value.trim();
    let is_date = property
        .param("VALUE")
        .is_some_and(|kind| kind.eq_ignore_ascii_case("DATE"))
        || value.len() == 8;
    if is_date {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0));
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        return Some(Local.from_utc_datetime(&naive).naive_local());
    }
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()
}

fn parse_attendee(property: &Property<'_>) -> Attendee {
    let name = match property.param("CN") {
        Some(cn) if !cn.trim().is_empty() => cn.trim().to_string(),
        _ => {
            let value = property.value.trim();
            value
                .strip_prefix("mailto:")
                .or_else(|| value.strip_prefix("MAILTO:"))
                .unwrap_or(value)
                .to_string()
        }
    };
    let status = property
        .param("PARTSTAT")
        .map(PartStat::parse)
        .unwrap_or(PartStat::NeedsAction);
    Attendee { name, status }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const SAMPLE: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:abc\r\n\
SUMMARY:Sprint planning\\, part 2\r\n\
DTSTART;TZID=Europe/Berlin:20260304T093000\r\n\
DTEND;TZID=Europe/Berlin:20260304T103000\r\n\
ATTENDEE;CN=\"Doe, Jane\";PARTSTAT=ACCEPTED:mailto:jane@example.com\r\n\
ATTENDEE;PARTSTAT=DECLINED;CN=John Smith:mailto:john@example.com\r\n\
ATTENDEE;CN=Konferenzraum 1;PARTSTAT=ACCE\r\n\
\x20PTED:mailto:room1@example.com\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
SUMMARY:Reminder\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn reads_summary_times_and_attendees() {
        let items = parse_events(SAMPLE);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title, "Sprint planning, part 2");
        let start = item.start.unwrap();
        assert_eq!((start.hour(), start.minute()), (9, 30));
        let end = item.end.unwrap();
        assert_eq!((end.hour(), end.minute()), (10, 30));
        assert_eq!(
            item.attendees,
            vec![
                Attendee::new("Doe, Jane", PartStat::Accepted),
                Attendee::new("John Smith", PartStat::Declined),
                Attendee::new("Konferenzraum 1", PartStat::Accepted),
            ]
        );
    }

    #[test]
    fn utc_times_become_local() {
        let ics = "BEGIN:VEVENT\nSUMMARY:Call\nDTSTART:20260304T120000Z\nDTEND:20260304T123000Z\nEND:VEVENT\n";
        let items = parse_events(ics);
        let expected = Local
            .from_utc_datetime(&NaiveDate::from_ymd_opt(2026, 3, 4).unwrap().and_hms_opt(12, 0, 0).unwrap())
            .naive_local();
        assert_eq!(items[0].start, Some(expected));
    }

    #[test]
    fn missing_end_is_left_empty() {
        let ics = "BEGIN:VEVENT\nSUMMARY:Open end\nDTSTART:20260304T090000\nEND:VEVENT\n";
        let items = parse_events(ics);
        assert_eq!(items.len(), 1);
        assert!(items[0].start.is_some());
        assert!(items[0].end.is_none());
    }

    #[test]
    fn attendee_without_cn_falls_back_to_address() {
        let ics = "BEGIN:VEVENT\nATTENDEE;PARTSTAT=TENTATIVE:mailto:a@example.com\nEND:VEVENT\n";
        let items = parse_events(ics);
        assert_eq!(items[0].attendees, vec![Attendee::new("a@example.com", PartStat::Tentative)]);
    }

    #[test]
    fn all_day_events_start_at_midnight() {
        let ics = "BEGIN:VEVENT\nDTSTART;VALUE=DATE:20260304\nDTEND;VALUE=DATE:20260305\nEND:VEVENT\n";
        let items = parse_events(ics);
        assert_eq!(items[0].start.unwrap().hour(), 0);
    }
}
