use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Method;
use tracing::debug;

use crate::clients::ical;
use crate::error::ClientError;
use crate::models::calendar::CalendarItem;

const CALDAV_TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub struct CalDavCredentials<'a> {
    pub url: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// Runs a `calendar-query` REPORT for VEVENTs overlapping `[start, end]`.
/// Items come back in the order the server listed them.
pub async fn calendar_query(
    http: &reqwest::Client,
    credentials: &CalDavCredentials<'_>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<CalendarItem>, ClientError> {
    let report = Method::from_bytes(b"REPORT").map_err(|e| ClientError::Malformed(e.to_string()))?;
    let response = http
        .request(report, credentials.url)
        .basic_auth(credentials.username, Some(credentials.password))
        .header("Depth", "1")
        .header("Content-Type", "application/xml; charset=utf-8")
        .body(query_body(start, end))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status(status));
    }

    let body = response.text().await?;
    let documents = calendar_data(&body)?;
    debug!(count = documents.len(), "calendar-data documents received");
    Ok(documents.iter().flat_map(|doc| ical::parse_events(doc)).collect())
}

pub fn query_body(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
         <C:calendar-query xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\">\n\
         <D:prop><D:getetag/><C:calendar-data/></D:prop>\n\
         <C:filter><C:comp-filter name=\"VCALENDAR\"><C:comp-filter name=\"VEVENT\">\n\
         <C:time-range start=\"{start}\" end=\"{end}\"/>\n\
         </C:comp-filter></C:comp-filter></C:filter>\n\
         </C:calendar-query>",
        start = start.format(CALDAV_TIME_FORMAT),
        end = end.format(CALDAV_TIME_FORMAT),
    )
}

/// Pulls the text of every `calendar-data` element out of a multistatus body,
/// whatever namespace prefix the server picked.
pub fn calendar_data(multistatus: &str) -> Result<Vec<String>, ClientError> {
    let mut reader = Reader::from_str(multistatus);
    let mut documents = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) if tag.local_name().as_ref() == b"calendar-data" => {
                current = Some(String::new());
            }
            Ok(Event::End(tag)) if tag.local_name().as_ref() == b"calendar-data" => {
                if let Some(doc) = current.take() {
                    documents.push(doc);
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(doc) = current.as_mut() {
                    let text = text.unescape().map_err(|e| ClientError::Malformed(e.to_string()))?;
                    doc.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(doc) = current.as_mut() {
                    doc.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ClientError::Malformed(e.to_string())),
        }
    }

    Ok(documents)
}
