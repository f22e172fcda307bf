pub mod caldav_client;
pub mod ical;
pub mod toggl_client;
