use async_trait::async_trait;

use crate::clients::toggl_client::{self, TOGGL_API_BASE};
use crate::error::ClientError;

/// "Is the owner working right now?"
#[async_trait]
pub trait PresenceSignal: Send + Sync {
    async fn is_working(&self) -> Result<bool, ClientError>;
}

pub struct TogglPresence {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TogglPresence {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: TOGGL_API_BASE.to_string(),
        }
    }
}

#[async_trait]
impl PresenceSignal for TogglPresence {
    async fn is_working(&self) -> Result<bool, ClientError> {
        let entry = toggl_client::fetch_current_entry(&self.http, &self.base_url, &self.api_key).await?;
        Ok(entry.is_some())
    }
}
