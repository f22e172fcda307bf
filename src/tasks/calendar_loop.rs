use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, Utc};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::calendar::CalendarItem;
use crate::models::event::{DisplayEvent, format_wall_clock};
use crate::service::calendar_service::CalendarSource;
use crate::service::event_state::{EventOrigin, EventState, Transition};
use crate::service::participants;
use crate::service::presence_service::PresenceSignal;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

// Wake-up granularity of the loop; much finer than the poll interval so a
// stop request is seen quickly.
const TICK: Duration = Duration::from_millis(100);

/// How long before its own end a manual entry may be cleared by an empty poll.
pub const MANUAL_GRACE_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub lookback: TimeDelta,
    pub lookahead: TimeDelta,
    pub excluded_attendees: Vec<String>,
    /// Presence assumed when the presence service cannot be reached.
    pub presence_on_error: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            lookback: TimeDelta::minutes(5),
            lookahead: TimeDelta::minutes(5),
            excluded_attendees: Vec::new(),
            presence_on_error: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Presence was negative; the idle-clear policy ran.
    NotWorking(Transition),
    /// An item was found and pushed into the state.
    Event(Transition),
    /// The calendar had nothing usable; the idle-clear policy ran.
    NoEvent(Transition),
    /// The calendar lookup failed; state was left alone.
    Skipped,
}

pub struct CalendarPoller {
    state: Arc<EventState>,
    presence: Arc<dyn PresenceSignal>,
    calendar: Arc<dyn CalendarSource>,
    settings: PollSettings,
}

impl CalendarPoller {
    pub fn new(
        state: Arc<EventState>,
        presence: Arc<dyn PresenceSignal>,
        calendar: Arc<dyn CalendarSource>,
        settings: PollSettings,
    ) -> Self {
        Self {
            state,
            presence,
            calendar,
            settings,
        }
    }

    /// Polls whenever `poll_interval` has elapsed since the previous cycle,
    /// until `token` is cancelled. A cycle in flight always completes.
    pub async fn run(self, poll_interval: watch::Receiver<Duration>, token: CancellationToken) {
        info!("poll loop started");
        let mut ticker = interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_cycle: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let every = *poll_interval.borrow();
            if last_cycle.is_some_and(|at| at.elapsed() < every) {
                continue;
            }
            let outcome = self.poll_once(Local::now()).await;
            debug!(?outcome, "poll cycle finished");
            last_cycle = Some(Instant::now());
        }
        info!("poll loop stopped");
    }

    /// One full cycle: presence, calendar lookup, state update.
    pub async fn poll_once(&self, now: DateTime<Local>) -> PollOutcome {
        debug!(%now, "poll");
        if !self.check_presence().await {
            info!("not working");
            return PollOutcome::NotWorking(self.idle_clear(now));
        }

        let now_utc = now.with_timezone(&Utc);
        let items = match self
            .calendar
            .events_between(now_utc - self.settings.lookback, now_utc + self.settings.lookahead)
            .await
        {
            Ok(items) => items,
            Err(err) => {
                warn!(%err, "calendar lookup failed, skipping cycle");
                return PollOutcome::Skipped;
            }
        };

        match items.iter().find_map(|item| self.to_display_event(item)) {
            Some(event) => PollOutcome::Event(self.state.set_current(Some(event), EventOrigin::Calendar)),
            None => {
                info!("no events");
                PollOutcome::NoEvent(self.idle_clear(now))
            }
        }
    }

    async fn check_presence(&self) -> bool {
        match self.presence.is_working().await {
            Ok(working) => working,
            Err(err) => {
                warn!(%err, fallback = self.settings.presence_on_error, "presence lookup failed");
                self.settings.presence_on_error
            }
        }
    }

    /// Calendar entries are cleared at once. Manual entries survive until
    /// their own end is less than `MANUAL_GRACE_MINUTES` away.
    fn idle_clear(&self, now: DateTime<Local>) -> Transition {
        let grace = TimeDelta::minutes(MANUAL_GRACE_MINUTES);
        self.state.clear_when(|current, origin| match origin {
            EventOrigin::Calendar => true,
            EventOrigin::Manual => current.end_datetime(now) < now + grace,
        })
    }

    fn to_display_event(&self, item: &CalendarItem) -> Option<DisplayEvent> {
        let (Some(start), Some(end)) = (item.start, item.end) else {
            warn!(title = %item.title, "calendar item without start or end, skipping");
            return None;
        };
        Some(DisplayEvent::new(
            item.title.clone(),
            format_wall_clock(&start),
            format_wall_clock(&end),
            participants::display_names(&item.attendees, &self.settings.excluded_attendees),
        ))
    }
}
