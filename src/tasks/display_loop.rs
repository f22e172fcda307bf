use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::display::OutputSurface;
use crate::service::event_state::{EventState, ManualOverride, PowerState};

pub const DEFAULT_REFRESH_HZ: f64 = 1.0;

/// Operator-side controls for the display. Cheap to clone; forcing wakes the
/// refresh loop so the surface follows without waiting out the tick.
#[derive(Clone)]
pub struct DisplayHandle {
    state: Arc<EventState>,
    wake: Arc<Notify>,
}

impl DisplayHandle {
    pub fn force_on(&self) -> PowerState {
        self.apply(ManualOverride::ForcedOn)
    }

    pub fn force_off(&self) -> PowerState {
        self.apply(ManualOverride::ForcedOff)
    }

    /// Back to automatic control, picked up on the next tick.
    pub fn reset_override(&self) {
        self.state.set_override(ManualOverride::Auto);
        info!("display override cleared");
    }

    fn apply(&self, mode: ManualOverride) -> PowerState {
        let power = self.state.set_override(mode);
        info!(?mode, on = power.is_on, "display override set");
        self.wake.notify_one();
        power
    }
}

pub struct DisplayDriver<S: OutputSurface> {
    state: Arc<EventState>,
    surface: S,
    wake: Arc<Notify>,
    lit: bool,
    rendered_generation: u64,
}

impl<S: OutputSurface> DisplayDriver<S> {
    pub fn new(state: Arc<EventState>, surface: S) -> Self {
        Self {
            state,
            surface,
            wake: Arc::new(Notify::new()),
            lit: false,
            rendered_generation: 0,
        }
    }

    pub fn handle(&self) -> DisplayHandle {
        DisplayHandle {
            state: self.state.clone(),
            wake: self.wake.clone(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// One refresh: settle power, then draw the next scroll frame if lit.
    pub fn tick(&mut self) -> PowerState {
        let power = self.state.settle_power();
        if power.is_on != self.lit {
            if !power.is_on {
                report(self.surface.clear(), "clear");
            }
            let result = self.surface.set_backlight(power.is_on);
            report(result, "backlight");
            self.lit = power.is_on;
            info!(on = power.is_on, "display power");
        }
        if !power.is_on {
            return power;
        }

        let generation = self.state.generation();
        if generation != self.rendered_generation {
            report(self.surface.clear(), "clear");
            self.rendered_generation = generation;
        }
        if let Some(lines) = self.state.next_frame() {
            for (row, line) in lines.iter().enumerate() {
                let result = self.surface.write_line(row, line);
                report(result, "write");
            }
        }
        power
    }

    /// Ticks at the configured rate until `token` is cancelled, then blanks
    /// and releases the surface before returning.
    pub async fn run(mut self, mut refresh_hz: watch::Receiver<f64>, token: CancellationToken) {
        info!("display loop started");
        loop {
            self.tick();
            let period = refresh_period(*refresh_hz.borrow_and_update());
            tokio::select! {
                _ = token.cancelled() => break,
                _ = sleep(period) => {}
                _ = self.wake.notified() => debug!("display woken"),
                Ok(()) = refresh_hz.changed() => debug!("refresh rate changed"),
            }
        }
        self.shutdown();
        info!("display loop stopped");
    }

    pub fn shutdown(&mut self) {
        report(self.surface.clear(), "clear");
        let result = self.surface.set_backlight(false);
        report(result, "backlight");
        self.lit = false;
        report(self.surface.close(), "close");
    }
}

fn report(result: std::io::Result<()>, op: &str) {
    if let Err(err) = result {
        warn!(%err, op, "display surface error");
    }
}

/// Tick period for `hz`, or `None` when the rate is not positive or its
/// period does not fit in a `Duration`.
pub fn period_for(hz: f64) -> Option<Duration> {
    if !hz.is_finite() || hz <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / hz).ok()
}

fn refresh_period(hz: f64) -> Duration {
    period_for(hz).unwrap_or(Duration::from_secs(1))
}
