use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use calendarIndicator::error::ClientError;
use calendarIndicator::models::calendar::{Attendee, CalendarItem, PartStat};
use calendarIndicator::models::event::DisplayEvent;
use calendarIndicator::service::calendar_service::CalendarSource;
use calendarIndicator::service::event_state::{EventOrigin, EventState, LineLayout, Transition};
use calendarIndicator::service::presence_service::PresenceSignal;
use calendarIndicator::tasks::calendar_loop::{CalendarPoller, PollOutcome, PollSettings};

struct ScriptedPresence {
    answer: Mutex<Result<bool, String>>,
}

impl ScriptedPresence {
    fn working(working: bool) -> Arc<Self> {
        Arc::new(Self {
            answer: Mutex::new(Ok(working)),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: Mutex::new(Err("connection refused".to_string())),
        })
    }

    fn set(&self, working: bool) {
        *self.answer.lock().unwrap() = Ok(working);
    }
}

#[async_trait]
impl PresenceSignal for ScriptedPresence {
    async fn is_working(&self) -> Result<bool, ClientError> {
        self.answer
            .lock()
            .unwrap()
            .clone()
            .map_err(ClientError::Malformed)
    }
}

#[derive(Default)]
struct ScriptedCalendar {
    items: Mutex<Option<Vec<CalendarItem>>>,
    windows: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl ScriptedCalendar {
    fn with_items(items: Vec<CalendarItem>) -> Arc<Self> {
        let calendar = Self::default();
        *calendar.items.lock().unwrap() = Some(items);
        Arc::new(calendar)
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn set(&self, items: Vec<CalendarItem>) {
        *self.items.lock().unwrap() = Some(items);
    }

    fn calls(&self) -> usize {
        self.windows.lock().unwrap().len()
    }
}

#[async_trait]
impl CalendarSource for ScriptedCalendar {
    async fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarItem>, ClientError> {
        self.windows.lock().unwrap().push((start, end));
        self.items
            .lock()
            .unwrap()
            .clone()
            .ok_or(ClientError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).single().unwrap()
}

fn wall(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn item(title: &str, start: (u32, u32), end: (u32, u32), attendees: Vec<Attendee>) -> CalendarItem {
    CalendarItem {
        title: title.to_string(),
        start: Some(wall(start.0, start.1)),
        end: Some(wall(end.0, end.1)),
        attendees,
    }
}

fn poller(
    state: &Arc<EventState>,
    presence: Arc<ScriptedPresence>,
    calendar: Arc<ScriptedCalendar>,
    settings: PollSettings,
) -> CalendarPoller {
    CalendarPoller::new(state.clone(), presence, calendar, settings)
}

fn state() -> Arc<EventState> {
    Arc::new(EventState::new(LineLayout::default()))
}

#[tokio::test]
async fn first_item_becomes_current_with_filtered_participants() {
    let state = state();
    let calendar = ScriptedCalendar::with_items(vec![
        item(
            "Planning",
            (9, 55),
            (10, 30),
            vec![
                Attendee::new("Room A", PartStat::Accepted),
                Attendee::new("Doe, Jane", PartStat::Accepted),
                Attendee::new("Smith, John", PartStat::Declined),
            ],
        ),
        item("Later", (10, 4), (10, 30), Vec::new()),
    ]);
    let settings = PollSettings {
        excluded_attendees: vec!["Room A".to_string()],
        ..PollSettings::default()
    };
    let poller = poller(&state, ScriptedPresence::working(true), calendar.clone(), settings);

    let outcome = poller.poll_once(at(10, 0)).await;

    assert_eq!(outcome, PollOutcome::Event(Transition::New));
    let current = state.get_current().unwrap();
    assert_eq!(current, DisplayEvent::new("Planning", "9:55", "10:30", Vec::new()));
    assert_eq!(current.participants, vec!["Jane Doe".to_string()]);
    assert_eq!(state.origin(), EventOrigin::Calendar);

    let (start, end) = calendar.windows.lock().unwrap()[0];
    assert_eq!(end - start, chrono::TimeDelta::minutes(10));
}

#[tokio::test]
async fn same_item_twice_is_unchanged() {
    let state = state();
    let calendar = ScriptedCalendar::with_items(vec![item("Planning", (9, 55), (10, 30), Vec::new())]);
    let poller = poller(&state, ScriptedPresence::working(true), calendar, PollSettings::default());

    assert_eq!(poller.poll_once(at(10, 0)).await, PollOutcome::Event(Transition::New));
    assert_eq!(poller.poll_once(at(10, 1)).await, PollOutcome::Event(Transition::Unchanged));
    assert_eq!(state.generation(), 1);
}

#[tokio::test]
async fn malformed_item_is_skipped_for_the_next_one() {
    let state = state();
    let broken = CalendarItem {
        title: "No end".to_string(),
        start: Some(wall(9, 50)),
        end: None,
        attendees: Vec::new(),
    };
    let calendar = ScriptedCalendar::with_items(vec![broken, item("Review", (10, 0), (10, 45), Vec::new())]);
    let poller = poller(&state, ScriptedPresence::working(true), calendar, PollSettings::default());

    poller.poll_once(at(10, 0)).await;

    assert_eq!(state.get_current().unwrap().name, "Review");
}

#[tokio::test]
async fn not_working_clears_calendar_event_without_asking_calendar() {
    let state = state();
    let presence = ScriptedPresence::working(true);
    let calendar = ScriptedCalendar::with_items(vec![item("Planning", (9, 55), (10, 30), Vec::new())]);
    let poller = poller(&state, presence.clone(), calendar.clone(), PollSettings::default());
    poller.poll_once(at(10, 0)).await;

    presence.set(false);
    let outcome = poller.poll_once(at(10, 1)).await;

    assert_eq!(outcome, PollOutcome::NotWorking(Transition::Ended));
    assert!(state.get_current().is_none());
    assert_eq!(calendar.calls(), 1);
}

#[tokio::test]
async fn calendar_failure_leaves_state_alone() {
    let state = state();
    state.set_current(
        Some(DisplayEvent::new("Planning", "9:55", "10:30", Vec::new())),
        EventOrigin::Calendar,
    );
    let poller = poller(
        &state,
        ScriptedPresence::working(true),
        ScriptedCalendar::failing(),
        PollSettings::default(),
    );

    assert_eq!(poller.poll_once(at(10, 0)).await, PollOutcome::Skipped);
    assert_eq!(state.get_current().unwrap().name, "Planning");
}

#[tokio::test]
async fn presence_failure_uses_configured_fallback() {
    let state = state();
    let calendar = ScriptedCalendar::with_items(vec![item("Planning", (9, 55), (10, 30), Vec::new())]);

    let pessimistic = poller(
        &state,
        ScriptedPresence::failing(),
        calendar.clone(),
        PollSettings::default(),
    );
    assert_eq!(
        pessimistic.poll_once(at(10, 0)).await,
        PollOutcome::NotWorking(Transition::Unchanged)
    );
    assert_eq!(calendar.calls(), 0);

    let optimistic = poller(
        &state,
        ScriptedPresence::failing(),
        calendar.clone(),
        PollSettings {
            presence_on_error: true,
            ..PollSettings::default()
        },
    );
    assert_eq!(optimistic.poll_once(at(10, 0)).await, PollOutcome::Event(Transition::New));
}

#[tokio::test]
async fn manual_entry_survives_empty_polls_until_grace_window() {
    let state = state();
    let calendar = ScriptedCalendar::with_items(Vec::new());
    let poller = poller(&state, ScriptedPresence::working(true), calendar, PollSettings::default());
    state.set_current(
        Some(DisplayEvent::new("Focus", "10:00", "10:10", Vec::new())),
        EventOrigin::Manual,
    );

    // Ends at 10:10:59, more than five minutes away.
    assert_eq!(poller.poll_once(at(10, 0)).await, PollOutcome::NoEvent(Transition::Unchanged));
    assert_eq!(state.get_current().unwrap().name, "Focus");

    // Ends at 10:10:59, now inside the window.
    assert_eq!(poller.poll_once(at(10, 6)).await, PollOutcome::NoEvent(Transition::Ended));
    assert!(state.get_current().is_none());
}

#[tokio::test]
async fn manual_entry_close_to_its_end_is_cleared_when_not_working() {
    let state = state();
    let poller = poller(
        &state,
        ScriptedPresence::working(false),
        ScriptedCalendar::with_items(Vec::new()),
        PollSettings::default(),
    );
    state.set_current(
        Some(DisplayEvent::new("Call", "9:30", "10:01", Vec::new())),
        EventOrigin::Manual,
    );

    assert_eq!(poller.poll_once(at(10, 0)).await, PollOutcome::NotWorking(Transition::Ended));
}

#[tokio::test]
async fn calendar_item_replaces_manual_entry() {
    let state = state();
    let calendar = ScriptedCalendar::with_items(Vec::new());
    let poller = poller(&state, ScriptedPresence::working(true), calendar.clone(), PollSettings::default());
    state.set_current(
        Some(DisplayEvent::new("Focus", "10:00", "11:00", Vec::new())),
        EventOrigin::Manual,
    );

    calendar.set(vec![item("All hands", (10, 0), (10, 30), Vec::new())]);
    assert_eq!(poller.poll_once(at(10, 2)).await, PollOutcome::Event(Transition::New));
    assert_eq!(state.origin(), EventOrigin::Calendar);
}

#[tokio::test]
async fn nothing_to_clear_when_idle() {
    let state = state();
    let poller = poller(
        &state,
        ScriptedPresence::working(true),
        ScriptedCalendar::with_items(Vec::new()),
        PollSettings::default(),
    );

    assert_eq!(poller.poll_once(at(10, 0)).await, PollOutcome::NoEvent(Transition::Unchanged));
}
