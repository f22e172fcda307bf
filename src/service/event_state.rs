use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::models::event::DisplayEvent;
use crate::service::scroller::{self, DEFAULT_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    New,
    Ended,
    Unchanged,
}

/// Who made the last `set_current` call. The poller's idle-clear policy
/// gives manual entries a grace window before clearing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOrigin {
    #[default]
    Calendar,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManualOverride {
    #[default]
    Auto,
    ForcedOn,
    ForcedOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecondLine {
    #[default]
    Time,
    Participants,
}

/// How an event is laid out on the two display lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLayout {
    pub width: usize,
    pub long_name_label: Option<String>,
    pub second_line: SecondLine,
}

impl Default for LineLayout {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            long_name_label: Some("Meeting".to_string()),
            second_line: SecondLine::Time,
        }
    }
}

impl LineLayout {
    pub fn compose(&self, event: &DisplayEvent) -> [String; 2] {
        let first = match &self.long_name_label {
            Some(label) if event.name.chars().count() > self.width => label.clone(),
            _ => event.name.clone(),
        };
        let second = match self.second_line {
            SecondLine::Time => event.time_range(),
            SecondLine::Participants => event.participants.join(", "),
        };
        [first, second]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollCursor {
    pub text: String,
    pub offset: usize,
}

impl ScrollCursor {
    fn reset(&mut self, text: String) {
        self.text = text;
        self.offset = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerState {
    pub is_on: bool,
    pub changed: bool,
}

#[derive(Debug, Default)]
struct Inner {
    current: Option<DisplayEvent>,
    origin: EventOrigin,
    cursors: [ScrollCursor; 2],
    generation: u64,
    display_on: bool,
    override_mode: ManualOverride,
}

/// The shared "what is showing right now" value.
///
/// Everything lives behind one mutex that is only ever held for in-memory
/// work, never across I/O or an `.await`.
#[derive(Debug)]
pub struct EventState {
    layout: LineLayout,
    inner: Mutex<Inner>,
}

impl EventState {
    pub fn new(layout: LineLayout) -> Self {
        Self {
            layout,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner holds plain values; a panicked holder cannot leave it half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn layout(&self) -> &LineLayout {
        &self.layout
    }

    /// Replaces the current event and reports what kind of change it was.
    ///
    /// A new event resets both scroll cursors to the freshly composed lines
    /// before the lock is released, so the display never renders a new event
    /// with a stale offset.
    pub fn set_current(&self, event: Option<DisplayEvent>, origin: EventOrigin) -> Transition {
        let mut inner = self.lock();
        self.replace(&mut inner, event, origin)
    }

    /// Clears the current event if `should_clear` agrees, deciding and
    /// clearing under one lock so a concurrent manual entry cannot be lost.
    pub fn clear_when<F>(&self, should_clear: F) -> Transition
    where
        F: FnOnce(&DisplayEvent, EventOrigin) -> bool,
    {
        let mut inner = self.lock();
        let clear = match &inner.current {
            Some(current) => should_clear(current, inner.origin),
            None => false,
        };
        if !clear {
            return Transition::Unchanged;
        }
        self.replace(&mut inner, None, EventOrigin::Calendar)
    }

    fn replace(&self, inner: &mut Inner, event: Option<DisplayEvent>, origin: EventOrigin) -> Transition {
        let transition = match (&inner.current, &event) {
            (Some(_), None) => Transition::Ended,
            (previous, Some(next)) if previous.as_ref() != Some(next) => Transition::New,
            _ => Transition::Unchanged,
        };

        match transition {
            Transition::Ended => {
                if let Some(previous) = &inner.current {
                    info!(name = %previous.name, end = %previous.end_time, "event ended");
                }
            }
            Transition::New => {
                if let Some(next) = &event {
                    info!(name = %next.name, start = %next.start_time, end = %next.end_time, ?origin, "new event");
                    let [first, second] = self.layout.compose(next);
                    inner.cursors[0].reset(first);
                    inner.cursors[1].reset(second);
                    inner.generation += 1;
                }
            }
            Transition::Unchanged => {}
        }

        inner.current = event;
        inner.origin = origin;
        transition
    }

    pub fn get_current(&self) -> Option<DisplayEvent> {
        self.lock().current.clone()
    }

    pub fn snapshot(&self) -> (Option<DisplayEvent>, EventOrigin) {
        let inner = self.lock();
        (inner.current.clone(), inner.origin)
    }

    pub fn origin(&self) -> EventOrigin {
        self.lock().origin
    }

    /// Number of new-event transitions seen so far.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn is_display_on(&self) -> bool {
        self.lock().display_on
    }

    pub fn override_mode(&self) -> ManualOverride {
        self.lock().override_mode
    }

    /// Sets the override. Forcing applies the power change at once;
    /// returning to `Auto` leaves power alone until the next `settle_power`.
    pub fn set_override(&self, mode: ManualOverride) -> PowerState {
        let mut inner = self.lock();
        inner.override_mode = mode;
        let was_on = inner.display_on;
        match mode {
            ManualOverride::ForcedOn => inner.display_on = true,
            ManualOverride::ForcedOff => inner.display_on = false,
            ManualOverride::Auto => {}
        }
        PowerState {
            is_on: inner.display_on,
            changed: was_on != inner.display_on,
        }
    }

    /// Applies the automatic power rule against the current event.
    pub fn settle_power(&self) -> PowerState {
        let mut inner = self.lock();
        let was_on = inner.display_on;
        inner.display_on = desired_power(inner.current.is_some(), inner.override_mode);
        PowerState {
            is_on: inner.display_on,
            changed: was_on != inner.display_on,
        }
    }

    /// Advances both scroll cursors one step and returns what to show, or
    /// `None` when there is no event.
    pub fn next_frame(&self) -> Option<[String; 2]> {
        let width = self.layout.width;
        let mut inner = self.lock();
        if inner.current.is_none() {
            return None;
        }
        let mut lines: [String; 2] = Default::default();
        for (line, cursor) in lines.iter_mut().zip(inner.cursors.iter_mut()) {
            let (visible, next) = scroller::scroll(&cursor.text, cursor.offset, width);
            cursor.offset = next;
            *line = visible;
        }
        Some(lines)
    }

    pub fn cursors(&self) -> [ScrollCursor; 2] {
        self.lock().cursors.clone()
    }
}

fn desired_power(has_event: bool, mode: ManualOverride) -> bool {
    match mode {
        ManualOverride::ForcedOn => true,
        ManualOverride::ForcedOff => false,
        ManualOverride::Auto => has_event,
    }
}
