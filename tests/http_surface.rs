use std::sync::Arc;

use calendarIndicator::display::console::ConsoleSurface;
use calendarIndicator::handlers::controls::OperatorControls;
use calendarIndicator::handlers::http::routes;
use calendarIndicator::service::event_state::{EventOrigin, EventState, LineLayout, ManualOverride};
use calendarIndicator::tasks::calendar_loop::DEFAULT_POLL_INTERVAL;
use calendarIndicator::tasks::display_loop::{DEFAULT_REFRESH_HZ, DisplayDriver};
use calendarIndicator::models::event::DisplayEvent;
use serde_json::Value;
use tokio::sync::watch;
use warp::http::StatusCode;

fn controls() -> (Arc<EventState>, Arc<OperatorControls>) {
    let state = Arc::new(EventState::new(LineLayout::default()));
    let driver = DisplayDriver::new(state.clone(), ConsoleSurface::new(Vec::new(), 16));
    let (poll_tx, _poll_rx) = watch::channel(DEFAULT_POLL_INTERVAL);
    let (refresh_tx, _refresh_rx) = watch::channel(DEFAULT_REFRESH_HZ);
    let controls = Arc::new(OperatorControls::new(
        state.clone(),
        driver.handle(),
        poll_tx,
        refresh_tx,
    ));
    (state, controls)
}

fn form_post(path: &str, body: &str) -> warp::test::RequestBuilder {
    warp::test::request()
        .method("POST")
        .path(path)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(body)
}

#[tokio::test]
async fn update_event_form_sets_manual_event() {
    let (state, controls) = controls();
    let filter = routes(controls);

    let res = form_post("/update-event", "event-name=Focus+time&event-start=9%3A00&event-end=10%3A30")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        state.get_current(),
        Some(DisplayEvent::new("Focus time", "9:00", "10:30", Vec::new()))
    );
    assert_eq!(state.origin(), EventOrigin::Manual);
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["manual"], Value::Bool(true));
    assert_eq!(body["event"]["name"], "Focus time");
}

#[tokio::test]
async fn empty_event_name_clears_manual_event() {
    let (state, controls) = controls();
    controls.enter_event("Focus time", "9:00", "10:30", Vec::new());
    let filter = routes(controls);

    let res = form_post("/update-event", "event-name=").reply(&filter).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(state.get_current().is_none());
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["event"], Value::Null);
    assert_eq!(body["manual"], Value::Bool(false));
}

#[tokio::test]
async fn display_off_forces_display_off() {
    let (state, controls) = controls();
    let filter = routes(controls);

    let res = warp::test::request()
        .method("POST")
        .path("/display/off")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(state.override_mode(), ManualOverride::ForcedOff);
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["display_mode"], "off");
    assert_eq!(body["display_on"], Value::Bool(false));
}

#[tokio::test]
async fn unknown_display_mode_is_bad_request() {
    let (state, controls) = controls();
    let filter = routes(controls);

    let res = warp::test::request()
        .method("POST")
        .path("/display/sideways")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.override_mode(), ManualOverride::Auto);
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("sideways"));
}

#[tokio::test]
async fn get_event_reports_status() {
    let (_state, controls) = controls();
    controls.enter_event("Standup", "9:00", "9:15", vec!["Jane Doe".to_string()]);
    let filter = routes(controls);

    let res = warp::test::request().path("/event").reply(&filter).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["event"]["start_time"], "9:00");
    assert_eq!(body["event"]["participants"][0], "Jane Doe");
    assert_eq!(body["display_mode"], "auto");
}
