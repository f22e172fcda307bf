use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tracing::{info, warn};

use crate::cli::Args;
use crate::config::IndicatorConfig;
use crate::display::OutputSurface;
use crate::display::char_lcd::CharLcd;
use crate::display::console::ConsoleSurface;
use crate::handlers::controls::OperatorControls;
use crate::handlers::http;
use crate::handlers::operator::{CommandProcessor, InquireInput};
use crate::service::calendar_service::CalDavCalendar;
use crate::service::event_state::EventState;
use crate::service::presence_service::TogglPresence;
use crate::tasks::calendar_loop::CalendarPoller;
use crate::tasks::display_loop::DisplayDriver;
use crate::tasks::task_runner::TaskRunner;

const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Wires everything together, runs until the operator quits (or Ctrl-C), then
/// stops the display, the poller and the HTTP surface in that order.
pub async fn run(args: Args, config: IndicatorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let surface = open_surface(&args, &config);
    let mut layout = config.layout.clone();
    layout.width = surface.width();
    let state = Arc::new(EventState::new(layout));

    let http_client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let presence = Arc::new(TogglPresence::new(
        http_client.clone(),
        config.toggl_api_key.clone(),
    ));
    let calendar = Arc::new(CalDavCalendar::new(
        http_client,
        config.caldav.url.clone(),
        config.caldav.username.clone(),
        config.caldav.password.clone(),
    ));

    let (poll_tx, poll_rx) = watch::channel(config.poll_interval);
    let (refresh_tx, refresh_rx) = watch::channel(config.refresh_hz);

    let driver = DisplayDriver::new(state.clone(), surface);
    let controls = Arc::new(OperatorControls::new(
        state.clone(),
        driver.handle(),
        poll_tx,
        refresh_tx,
    ));
    let poller = CalendarPoller::new(state, presence, calendar, config.poll.clone());

    let mut task_runner = TaskRunner::new();
    task_runner.add_task("display", move |token| {
        tokio::spawn(driver.run(refresh_rx, token))
    });
    task_runner.add_task("poller", move |token| {
        tokio::spawn(poller.run(poll_rx, token))
    });
    if let Some(addr) = args.http {
        let controls = controls.clone();
        task_runner.add_task("http", move |token| {
            tokio::spawn(http::serve(addr, controls, token))
        });
    }
    let running = task_runner.start_all();

    // inquire blocks its thread; keep it off the runtime so shutdown never
    // waits on a pending prompt.
    let (done_tx, done_rx) = oneshot::channel();
    thread::Builder::new()
        .name("operator".to_string())
        .spawn(move || {
            CommandProcessor::new(controls, InquireInput).run();
            let _ = done_tx.send(());
        })?;

    tokio::select! {
        _ = done_rx => info!("operator quit"),
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("interrupted"),
            Err(err) => warn!(%err, "failed to listen for ctrl-c"),
        },
    }

    running.stop_all().await;
    info!("indicator stopped");
    Ok(())
}

fn open_surface(args: &Args, config: &IndicatorConfig) -> Box<dyn OutputSurface> {
    let device = args.lcd_device.as_ref().or(config.lcd_device.as_ref());
    if let Some(path) = device {
        match CharLcd::open(path) {
            Ok(lcd) => {
                info!(path = %path.display(), "using character lcd");
                return Box::new(lcd);
            }
            Err(err) => warn!(path = %path.display(), %err, "lcd unavailable, using console"),
        }
    }
    Box::new(ConsoleSurface::stdout())
}
