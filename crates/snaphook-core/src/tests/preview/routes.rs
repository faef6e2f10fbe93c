use crate::{BroadcastHub, HistoryStore, PreviewState, UPDATE_EVENT, router};

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::{sync::mpsc, time::timeout};
use tower::ServiceExt;

fn setup() -> (Router, PreviewState, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(10);
    let state = PreviewState::new(HistoryStore::new(), BroadcastHub::new(), tx);
    (router(state.clone()), state, rx)
}

#[allow(clippy::unwrap_used)]
fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[allow(clippy::unwrap_used)]
fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(clippy::unwrap_used)]
async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(clippy::unwrap_used)]
fn write_png(tmp: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = tmp.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// WHAT: Requesting the latest image before any capture returns 404
/// WHY: The viewer shows its waiting state on a missing image
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_empty_history_when_requesting_image_then_not_found() {
    // Given: No images
    let (app, _state, _rx) = setup();

    // When: GET /image
    let response = app.oneshot(get("/image")).await.unwrap();

    // Then: 404
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// WHAT: The latest image is served as PNG bytes with no-cache headers
/// WHY: Viewers re-fetch on every update and must not see a cached frame
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_images_when_requesting_latest_then_png_bytes_served() {
    // Given: Two images in history
    let tmp = TempDir::new().unwrap();
    let (app, state, _rx) = setup();
    state.history.append(write_png(&tmp, "a.png", b"first"));
    state.history.append(write_png(&tmp, "b.png", b"second"));

    // When: GET /image without index
    let response = app.oneshot(get("/image")).await.unwrap();

    // Then: Latest bytes with PNG content type
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(body_string(response).await, "second");
}

/// WHAT: An index selects a position in history
/// WHY: The gallery links thumbnails by position
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_images_when_requesting_index_then_that_position_served() {
    // Given: Two images
    let tmp = TempDir::new().unwrap();
    let (app, state, _rx) = setup();
    state.history.append(write_png(&tmp, "a.png", b"first"));
    state.history.append(write_png(&tmp, "b.png", b"second"));

    // When: GET /image?index=0
    let response = app.oneshot(get("/image?index=0")).await.unwrap();

    // Then: The oldest image
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "first");
}

/// WHAT: Out-of-range or malformed index returns 404
/// WHY: Stale positions after a delete must fail cleanly
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_images_when_requesting_bad_index_then_not_found() {
    // Given: One image
    let tmp = TempDir::new().unwrap();
    let (app, state, _rx) = setup();
    state.history.append(write_png(&tmp, "a.png", b"first"));

    // When/Then: Out of range and non-numeric both 404
    let response = app.clone().oneshot(get("/image?index=3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/image?index=abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// WHAT: A record whose file vanished returns 404
/// WHY: Missing backing files must not surface as server errors
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_record_without_file_when_requesting_then_not_found() {
    // Given: A record pointing nowhere
    let (app, state, _rx) = setup();
    state.history.append("/nonexistent/snaphook-gone.png");

    // When: GET /image
    let response = app.oneshot(get("/image")).await.unwrap();

    // Then: 404
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// WHAT: The viewer page embeds a cache-busted image and subscribes to events
/// WHY: Live refresh depends on both
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_viewer_when_requested_then_embeds_image_and_event_source() {
    // Given: The router
    let (app, _state, _rx) = setup();

    // When: GET /
    let response = app.oneshot(get("/")).await.unwrap();

    // Then: HTML with the image and the event source
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains(r#"src="/image?t="#));
    assert!(html.contains("new EventSource('/events')"));
}

/// WHAT: The viewer page honours an index query
/// WHY: Gallery thumbnails open a specific position
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_index_when_requesting_viewer_then_image_points_at_position() {
    // Given: The router
    let (app, _state, _rx) = setup();

    // When: GET /?index=4
    let response = app.oneshot(get("/?index=4")).await.unwrap();

    // Then: The image source carries the index
    let html = body_string(response).await;
    assert!(html.contains(r#"src="/image?index=4&t="#));
}

/// WHAT: The gallery lists records newest first with a count header
/// WHY: Users browse recent captures first
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_two_records_when_requesting_history_then_newest_first() {
    // Given: Two records
    let (app, state, _rx) = setup();
    state.history.append("/nonexistent/a.png");
    state.history.append("/nonexistent/b.png");

    // When: GET /history
    let response = app.oneshot(get("/history")).await.unwrap();

    // Then: Count and ordering
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Screenshot History (2/50)"));
    let newest = html.find("Screenshot #2").unwrap();
    let oldest = html.find("Screenshot #1").unwrap();
    assert!(newest < oldest);
    assert!(html.contains("window.location='/?index=1'"));
    assert!(html.contains("deleteScreenshot(0, event)"));
}

/// WHAT: Delete without an index is rejected with 400
/// WHY: Malformed requests are validation errors
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_missing_index_when_deleting_then_bad_request() {
    // Given: The router
    let (app, _state, _rx) = setup();

    // When/Then: Empty form and missing form both 400
    let response = app.clone().oneshot(post_form("/delete", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/delete")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// WHAT: Delete removes the record and its file
/// WHY: Gallery delete must free disk space
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_records_when_deleting_index_then_removed_and_success() {
    // Given: Two records backed by files
    let tmp = TempDir::new().unwrap();
    let (app, state, _rx) = setup();
    let a = write_png(&tmp, "a.png", b"a");
    let b = write_png(&tmp, "b.png", b"b");
    state.history.append(a.clone());
    state.history.append(b.clone());

    // When: Deleting position 0
    let response = app.oneshot(post_form("/delete", "index=0")).await.unwrap();

    // Then: Success JSON, A gone, B now at position 0
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"success":true}"#);
    assert!(!a.exists());
    assert_eq!(state.history.get(0).unwrap().path, b);
}

/// WHAT: Deleting an invalid position still succeeds
/// WHY: Delete is idempotent and must never 500
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_stale_index_when_deleting_then_success_and_unchanged() {
    // Given: One record
    let (app, state, _rx) = setup();
    state.history.append("/nonexistent/a.png");

    // When/Then: Out of range and negative both succeed without change
    let response = app.clone().oneshot(post_form("/delete", "index=9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(post_form("/delete", "index=-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.history.len(), 1);
}

/// WHAT: Non-numeric delete index is a validation error
/// WHY: Garbage input must not silently delete position 0
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_non_numeric_index_when_deleting_then_bad_request() {
    // Given: One record
    let (app, state, _rx) = setup();
    state.history.append("/nonexistent/a.png");

    // When: index=abc
    let response = app.oneshot(post_form("/delete", "index=abc")).await.unwrap();

    // Then: 400, nothing removed
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.history.len(), 1);
}

/// WHAT: Clear-all empties history and deletes files
/// WHY: The gallery's clear button must remove everything
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_records_when_clearing_all_then_empty_and_success() {
    // Given: Two records backed by files
    let tmp = TempDir::new().unwrap();
    let (app, state, _rx) = setup();
    let a = write_png(&tmp, "a.png", b"a");
    let b = write_png(&tmp, "b.png", b"b");
    state.history.append(a.clone());
    state.history.append(b.clone());

    // When: POST /clear-all
    let request = Request::builder()
        .method("POST")
        .uri("/clear-all")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    // Then: Success, empty, files gone
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"success":true}"#);
    assert!(state.history.is_empty());
    assert!(!a.exists() && !b.exists());
}

/// WHAT: Posting a hotkey forwards it to the owning process
/// WHY: The settings page drives hotkey changes
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_hotkey_when_posting_settings_then_forwarded_and_success() {
    // Given: The router and its hotkey channel
    let (app, _state, mut rx) = setup();

    // When: POST /settings with a hotkey
    let response = app
        .oneshot(post_form("/settings", "hotkey=Ctrl%2BAlt%2BS"))
        .await
        .unwrap();

    // Then: Success and the channel received it
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"success":true}"#);
    assert_eq!(rx.try_recv().unwrap(), "Ctrl+Alt+S");
}

/// WHAT: Posting an empty hotkey renders the settings page
/// WHY: Nothing is forwarded without a value
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_empty_hotkey_when_posting_settings_then_page_rendered() {
    // Given: The router
    let (app, _state, mut rx) = setup();

    // When: POST /settings with an empty hotkey
    let response = app.oneshot(post_form("/settings", "hotkey=")).await.unwrap();

    // Then: HTML page, nothing forwarded
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("SnapHook Settings"));
    assert!(rx.try_recv().is_err());
}

/// WHAT: The event stream delivers one data frame per publish
/// WHY: Viewers refresh on each frame
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_event_stream_when_publishing_then_update_frame_received() {
    // Given: An open event stream
    let (app, state, _rx) = setup();
    let response = app.oneshot(get("/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );
    assert_eq!(state.hub.subscriber_count(), 1);

    // When: Publishing an update
    let mut body = response.into_body().into_data_stream();
    state.hub.publish(UPDATE_EVENT);

    // Then: A single `data: update` frame arrives
    let frame = timeout(Duration::from_secs(1), body.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(&frame[..], b"data: update\n\n");
}

/// WHAT: Dropping the response unsubscribes the viewer
/// WHY: Disconnect cleanup must run on every exit path
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_event_stream_when_client_disconnects_then_unsubscribed() {
    // Given: An open event stream
    let (app, state, _rx) = setup();
    let response = app.oneshot(get("/events")).await.unwrap();
    assert!(state.hub.has_subscribers());

    // When: The client goes away
    drop(response);

    // Then: No subscribers remain
    assert_eq!(state.hub.subscriber_count(), 0);
}

/// WHAT: Six viewers connect; the first is closed; a seventh evicts the second
/// WHY: Newest connection wins a slot, oldest-first eviction
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_six_viewers_when_connecting_then_first_closed_and_seventh_evicts_second() {
    // Given: Five viewers C1..C5
    let (app, state, _rx) = setup();
    let mut streams = Vec::new();
    for _ in 0..5 {
        let response = app.clone().oneshot(get("/events")).await.unwrap();
        streams.push(response.into_body().into_data_stream());
    }

    // When: C6 connects
    let c6 = app.clone().oneshot(get("/events")).await.unwrap();
    assert_eq!(c6.status(), StatusCode::OK);

    // Then: C1's stream ends server-side, five remain
    let end = timeout(Duration::from_secs(1), streams[0].next()).await.unwrap();
    assert!(end.is_none());
    assert_eq!(state.hub.subscriber_count(), 5);

    // When: C7 connects
    let c7 = app.oneshot(get("/events")).await.unwrap();
    assert_eq!(c7.status(), StatusCode::OK);

    // Then: C2 is closed, C3 still receives updates
    let end = timeout(Duration::from_secs(1), streams[1].next()).await.unwrap();
    assert!(end.is_none());
    assert_eq!(state.hub.subscriber_count(), 5);

    state.hub.publish(UPDATE_EVENT);
    let frame = timeout(Duration::from_secs(1), streams[2].next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(&frame[..], b"data: update\n\n");
}
