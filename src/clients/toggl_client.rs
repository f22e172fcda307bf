use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;

pub const TOGGL_API_BASE: &str = "https://api.track.toggl.com/api/v9";

#[derive(Debug, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    pub description: Option<String>,
}

/// Fetches the running time entry, `None` when the timer is stopped.
pub async fn fetch_current_entry(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
) -> Result<Option<TimeEntry>, ClientError> {
    let response = http
        .get(format!("{}/me/time_entries/current", base_url.trim_end_matches('/')))
        .basic_auth(api_key, Some("api_token"))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status(status));
    }

    let body = response.text().await?;
    debug!(%body, "toggl response");
    parse_current_entry(&body)
}

pub fn parse_current_entry(body: &str) -> Result<Option<TimeEntry>, ClientError> {
    serde_json::from_str::<Option<TimeEntry>>(body).map_err(|e| ClientError::Malformed(e.to_string()))
}
