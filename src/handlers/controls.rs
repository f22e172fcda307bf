use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::models::event::{DisplayEvent, format_wall_clock};
use crate::service::event_state::{EventOrigin, EventState, ManualOverride, Transition};
use crate::tasks::display_loop::{DisplayHandle, period_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCommand {
    On,
    Off,
    Reset,
}

impl DisplayCommand {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "on" => Some(DisplayCommand::On),
            "off" => Some(DisplayCommand::Off),
            "reset" => Some(DisplayCommand::Reset),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndicatorStatus {
    pub event: Option<DisplayEvent>,
    pub manual: bool,
    pub display_on: bool,
    pub display_mode: &'static str,
}

/// Everything an operator surface may touch. Shared by the console menu and
/// the HTTP endpoints.
pub struct OperatorControls {
    state: Arc<EventState>,
    display: DisplayHandle,
    poll_interval: watch::Sender<Duration>,
    refresh_hz: watch::Sender<f64>,
}

impl OperatorControls {
    pub fn new(
        state: Arc<EventState>,
        display: DisplayHandle,
        poll_interval: watch::Sender<Duration>,
        refresh_hz: watch::Sender<f64>,
    ) -> Self {
        Self {
            state,
            display,
            poll_interval,
            refresh_hz,
        }
    }

    /// Puts an operator-entered event on the display. An empty name clears
    /// whatever is showing instead.
    pub fn enter_event(
        &self,
        name: &str,
        start: &str,
        end: &str,
        participants: Vec<String>,
    ) -> Transition {
        let name = name.trim();
        if name.is_empty() {
            info!("manual clear");
            return self.state.set_current(None, EventOrigin::Manual);
        }
        let event = DisplayEvent::new(name, start.trim(), end.trim(), participants);
        self.state.set_current(Some(event), EventOrigin::Manual)
    }

    /// Manual entry starting now.
    pub fn enter_event_now(
        &self,
        name: &str,
        end: &str,
        participants: Vec<String>,
        now: DateTime<Local>,
    ) -> Transition {
        self.enter_event(name, &format_wall_clock(&now), end, participants)
    }

    pub fn display(&self, command: DisplayCommand) {
        match command {
            DisplayCommand::On => {
                self.display.force_on();
            }
            DisplayCommand::Off => {
                self.display.force_off();
            }
            DisplayCommand::Reset => self.display.reset_override(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        *self.poll_interval.borrow()
    }

    pub fn refresh_hz(&self) -> f64 {
        *self.refresh_hz.borrow()
    }

    /// Parses seconds; anything but a positive number is rejected and the
    /// old interval kept.
    pub fn set_poll_interval(&self, raw: &str) -> Result<Duration, String> {
        let secs = parse_positive(raw)?;
        let interval = Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())?;
        self.poll_interval.send_replace(interval);
        info!(?interval, "poll interval changed");
        Ok(interval)
    }

    pub fn set_refresh_hz(&self, raw: &str) -> Result<f64, String> {
        let hz = parse_positive(raw)?;
        if period_for(hz).is_none() {
            return Err(format!("{} Hz is too slow to schedule", hz));
        }
        self.refresh_hz.send_replace(hz);
        info!(hz, "display refresh rate changed");
        Ok(hz)
    }

    pub fn status(&self) -> IndicatorStatus {
        let (event, origin) = self.state.snapshot();
        let display_mode = match self.state.override_mode() {
            ManualOverride::Auto => "auto",
            ManualOverride::ForcedOn => "on",
            ManualOverride::ForcedOff => "off",
        };
        IndicatorStatus {
            manual: event.is_some() && origin == EventOrigin::Manual,
            event,
            display_on: self.state.is_display_on(),
            display_mode,
        }
    }
}

fn parse_positive(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw.trim()))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{} must be greater than zero", value));
    }
    Ok(value)
}
