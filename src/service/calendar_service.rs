use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::clients::caldav_client::{self, CalDavCredentials};
use crate::error::ClientError;
use crate::models::calendar::CalendarItem;

#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Items overlapping `[start, end]`, in the order the backend returns them.
    async fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarItem>, ClientError>;
}

pub struct CalDavCalendar {
    http: reqwest::Client,
    url: String,
    username: String,
    password: String,
}

impl CalDavCalendar {
    pub fn new(http: reqwest::Client, url: String, username: String, password: String) -> Self {
        Self {
            http,
            url,
            username,
            password,
        }
    }
}

#[async_trait]
impl CalendarSource for CalDavCalendar {
    async fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarItem>, ClientError> {
        let credentials = CalDavCredentials {
            url: &self.url,
            username: &self.username,
            password: &self.password,
        };
        caldav_client::calendar_query(&self.http, &credentials, start, end).await
    }
}
