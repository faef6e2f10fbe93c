use crate::{
    CoreError, CoreResult,
    preview::{PreviewState, pages},
};

use std::{
    convert::Infallible,
    panic::Location,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    Form, Json, Router,
    extract::{Query, State, rejection::FormRejection},
    http::{StatusCode, header},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use error_location::ErrorLocation;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// JSON body returned by mutating endpoints.
#[derive(Debug, Serialize)]
pub(crate) struct SuccessResponse {
    success: bool,
}

const SUCCESS: SuccessResponse = SuccessResponse { success: true };

#[derive(Debug, Deserialize)]
pub(crate) struct IndexQuery {
    index: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteForm {
    index: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SettingsForm {
    hotkey: Option<String>,
}

/// Build the preview router over `state`.
pub fn router(state: PreviewState) -> Router {
    Router::new()
        .route("/", get(viewer))
        .route("/image", get(image))
        .route("/history", get(history))
        .route("/delete", post(delete))
        .route("/clear-all", post(clear_all))
        .route("/events", get(events))
        .route("/settings", get(settings_page).post(change_hotkey))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::Validation { .. } => StatusCode::BAD_REQUEST,
            CoreError::Server { .. } | CoreError::Io { .. } => {
                error!(error = ?self, "Preview request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            CoreError::NotFound { what, .. } => what.clone(),
            CoreError::Validation { reason, .. } => reason.clone(),
            _ => "Internal server error".to_string(),
        };

        (status, message).into_response()
    }
}

#[track_caller]
fn not_found(what: &str) -> CoreError {
    CoreError::NotFound {
        what: what.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
fn invalid(reason: &str) -> CoreError {
    CoreError::Validation {
        reason: reason.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Empty strings count as absent, matching how browsers submit blank fields.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn cache_bust() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos())
}

async fn viewer(Query(query): Query<IndexQuery>) -> Html<String> {
    let index = non_empty(query.index.as_deref()).and_then(|raw| raw.parse::<usize>().ok());
    Html(pages::viewer(index, cache_bust()))
}

async fn image(
    State(state): State<PreviewState>,
    Query(query): Query<IndexQuery>,
) -> CoreResult<Response> {
    let record = match non_empty(query.index.as_deref()) {
        Some(raw) => {
            let position = raw
                .parse::<usize>()
                .map_err(|_| not_found("Image not found"))?;
            state.history.get(position)
        }
        None => state.history.latest(),
    }
    .ok_or_else(|| not_found("No image yet"))?;

    let bytes = tokio::fs::read(&record.path).await.map_err(|e| {
        warn!(sequence = record.sequence, path = ?record.path, error = ?e, "Image file unreadable");
        not_found("Image not found")
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
        ],
        bytes,
    )
        .into_response())
}

async fn history(State(state): State<PreviewState>) -> Html<String> {
    let records = state.history.records();
    Html(pages::history(&records, state.history.capacity()))
}

async fn delete(
    State(state): State<PreviewState>,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> CoreResult<Json<SuccessResponse>> {
    let raw = match &form {
        Ok(Form(f)) => non_empty(f.index.as_deref()),
        Err(rejection) => {
            debug!(error = %rejection, "Delete form rejected");
            None
        }
    }
    .ok_or_else(|| invalid("Missing index parameter"))?;

    let position = raw
        .parse::<i64>()
        .map_err(|_| invalid("Index must be an integer"))?;

    // Out-of-range positions (including negatives) are a no-op so a repeated
    // delete from a stale gallery never fails.
    let deleted = usize::try_from(position)
        .map(|p| state.history.delete_at(p))
        .unwrap_or(false);

    debug!(position, deleted, "Delete request handled");

    Ok(Json(SUCCESS))
}

async fn clear_all(State(state): State<PreviewState>) -> Json<SuccessResponse> {
    let removed = state.history.clear();
    info!(removed, "History cleared from preview");
    Json(SUCCESS)
}

async fn events(
    State(state): State<PreviewState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before the stream is polled so the viewer counts as connected
    // as soon as the request is accepted.
    let mut subscription = state.hub.subscribe();

    let stream = async_stream::stream! {
        while let Some(event) = subscription.recv().await {
            yield Ok(Event::default().data(event));
        }
        debug!(subscriber_id = subscription.id(), "Event stream closed by hub");
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn settings_page() -> Html<&'static str> {
    Html(pages::settings())
}

async fn change_hotkey(
    State(state): State<PreviewState>,
    form: Result<Form<SettingsForm>, FormRejection>,
) -> CoreResult<Response> {
    let hotkey = form
        .ok()
        .and_then(|Form(f)| non_empty(f.hotkey.as_deref()).map(str::to_string));

    let Some(hotkey) = hotkey else {
        return Ok(Html(pages::settings()).into_response());
    };

    state
        .hotkey_change_tx
        .send(hotkey.clone())
        .await
        .map_err(|e| CoreError::Server {
            reason: format!("Hotkey change channel closed: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!(hotkey = %hotkey, "Hotkey change requested");

    Ok(Json(SUCCESS).into_response())
}
