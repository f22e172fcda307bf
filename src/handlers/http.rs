use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;
use warp::Filter;
use warp::http::StatusCode;

use crate::handlers::controls::{DisplayCommand, OperatorControls};

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventForm {
    #[serde(rename = "event-name")]
    pub name: String,
    #[serde(rename = "event-start", default)]
    pub start: String,
    #[serde(rename = "event-end", default)]
    pub end: String,
}

/// `GET /event`, `POST /update-event` (form), `POST /display/{on|off|reset}`.
pub fn routes(
    controls: Arc<OperatorControls>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone + Send + Sync + 'static {
    let with_controls = warp::any().map(move || controls.clone());

    let status = warp::get()
        .and(warp::path("event"))
        .and(warp::path::end())
        .and(with_controls.clone())
        .map(|controls: Arc<OperatorControls>| {
            warp::reply::with_status(warp::reply::json(&controls.status()), StatusCode::OK)
        });

    let update = warp::post()
        .and(warp::path("update-event"))
        .and(warp::path::end())
        .and(warp::body::content_length_limit(4 * 1024))
        .and(warp::body::form::<UpdateEventForm>())
        .and(with_controls.clone())
        .map(|form: UpdateEventForm, controls: Arc<OperatorControls>| {
            info!(name = %form.name, "event update over http");
            controls.enter_event(&form.name, &form.start, &form.end, Vec::new());
            warp::reply::with_status(warp::reply::json(&controls.status()), StatusCode::OK)
        });

    let display = warp::post()
        .and(warp::path!("display" / String))
        .and(with_controls)
        .map(|mode: String, controls: Arc<OperatorControls>| match DisplayCommand::parse(&mode) {
            Some(command) => {
                controls.display(command);
                warp::reply::with_status(warp::reply::json(&controls.status()), StatusCode::OK)
            }
            None => warp::reply::with_status(
                warp::reply::json(&ErrorMessage {
                    error: format!("unknown display mode '{}'", mode),
                }),
                StatusCode::BAD_REQUEST,
            ),
        });

    status.or(update).or(display)
}

/// Serves the operator endpoints until `token` is cancelled.
pub async fn serve(addr: SocketAddr, controls: Arc<OperatorControls>, token: CancellationToken) {
    info!(%addr, "http operator surface listening");
    tokio::select! {
        _ = warp::serve(routes(controls)).run(addr) => {}
        _ = token.cancelled() => {}
    }
    info!("http operator surface stopped");
}
