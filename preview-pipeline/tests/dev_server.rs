#![cfg(not(target_arch = "wasm32"))]

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use preview_pipeline::config::PreviewConfig;
use preview_pipeline::file::VirtualFile;
use preview_pipeline::server::{live_router, router, DevState, FrameHost, SharedState};
use preview_pipeline::synth::{PatchHint, Synthesizer};
use tower_livereload::LiveReloadLayer;

fn state_with(config: PreviewConfig, files: Vec<VirtualFile>) -> SharedState {
    let state = DevState::new(config, FrameHost::default(), None).shared();
    {
        let mut guard = state.lock().expect("lock");
        assert_eq!(guard.controller.set_files(files), None);
    }
    state
}

fn app_state() -> SharedState {
    state_with(
        PreviewConfig::default(),
        vec![VirtualFile::new(
            "App.tsx",
            "export default function Hello() { return <div>Hi</div>; }",
        )],
    )
}

async fn send(state: &SharedState, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
    let resp = router(state.clone()).oneshot(req).await.expect("response");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, headers, String::from_utf8_lossy(&bytes).into_owned())
}

async fn get(state: &SharedState, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).expect("request");
    let (status, _, body) = send(state, req).await;
    (status, body)
}

async fn post(state: &SharedState, uri: &str, body: Value) -> Value {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    let (status, _, body) = send(state, req).await;
    assert_eq!(status, StatusCode::OK, "{uri}: {body}");
    serde_json::from_str(&body).expect("state json")
}

async fn state_json(state: &SharedState) -> Value {
    let (status, body) = get(state, "/state").await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_str(&body).expect("state json")
}

#[tokio::test]
async fn chrome_embeds_current_frame() {
    let state = app_state();
    let (status, body) = get(&state, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"src="/frame/1""#));
    assert!(body.contains("sandbox=\"allow-scripts"));
    assert!(!body.contains("allow-same-origin"));
    assert!(body.contains("/notify"));
}

#[tokio::test]
async fn superseded_frames_are_gone() {
    let state = app_state();
    let (status, body) = get(&state, "/frame/1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<div id=\"root\"></div>"));

    let after = post(&state, "/refresh", json!({})).await;
    assert_eq!(after["generation"], 2);
    assert_eq!(get(&state, "/frame/1").await.0, StatusCode::GONE);
    assert_eq!(get(&state, "/frame/2").await.0, StatusCode::OK);
}

#[tokio::test]
async fn export_matches_mounted_frame() {
    let state = app_state();
    let (_, frame) = get(&state, "/frame/1").await;
    let req = Request::builder().uri("/export").body(Body::empty()).expect("request");
    let (status, headers, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, frame);
    let disposition = headers
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(disposition.starts_with("attachment"));
}

#[tokio::test]
async fn live_reload_only_touches_the_chrome() {
    let files = vec![VirtualFile::new(
        "App.tsx",
        "export default function Hello() { return <div>Hi</div>; }",
    )];
    let expected = Synthesizer::default().synthesize(&files, &PatchHint::none());

    let layer = LiveReloadLayer::new();
    let state = DevState::new(PreviewConfig::default(), FrameHost::new(layer.reloader()), None).shared();
    {
        let mut guard = state.lock().expect("lock");
        guard.controller.set_files(files);
    }
    let (_, plain_chrome) = get(&state, "/").await;
    let app = live_router(state, layer);

    let mut bodies = Vec::new();
    for uri in ["/", "/frame/1", "/export"] {
        let req = Request::builder().uri(uri).body(Body::empty()).expect("request");
        let resp = app.clone().oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        bodies.push(String::from_utf8_lossy(&bytes).into_owned());
    }
    assert_ne!(bodies[0], plain_chrome, "chrome should carry the reload script");
    assert!(bodies[0].contains(r#"src="/frame/1""#));
    assert_eq!(bodies[1], expected);
    assert_eq!(bodies[2], expected);
}

#[tokio::test]
async fn export_without_document_is_not_found() {
    let state = state_with(PreviewConfig::default(), Vec::new());
    assert_eq!(get(&state, "/export").await.0, StatusCode::NOT_FOUND);
    let (_, body) = get(&state, "/").await;
    assert!(body.contains("waiting for code blocks"));
}

#[tokio::test]
async fn ready_notification_is_relayed() {
    let state = app_state();
    let s = post(
        &state,
        "/notify",
        json!({"generation": 1, "message": {"type": "preview-ready"}}),
    )
    .await;
    assert_eq!(s["status"], "ready");
    assert_eq!(s["ready"], true);
    assert_eq!(s["strategy"], "component");
    assert_eq!(s["entry"], "App.tsx");
}

#[tokio::test]
async fn stale_and_foreign_messages_are_ignored() {
    let state = app_state();
    post(&state, "/refresh", json!({})).await;
    let before = state_json(&state).await;
    post(
        &state,
        "/notify",
        json!({"generation": 1, "message": {"type": "preview-error", "error": "old"}}),
    )
    .await;
    post(
        &state,
        "/notify",
        json!({"generation": 2, "message": {"type": "webpackHotUpdate"}}),
    )
    .await;
    assert_eq!(state_json(&state).await, before);
}

#[tokio::test]
async fn error_recovers_on_a_timer() {
    let config = PreviewConfig {
        recovery_delay_ms: 10,
        ..PreviewConfig::default()
    };
    let state = state_with(
        config,
        vec![VirtualFile::new("App.tsx", "const App = () => <p>x</p>;")],
    );
    let s = post(
        &state,
        "/notify",
        json!({"generation": 1, "message": {"type": "preview-error", "error": "boom"}}),
    )
    .await;
    assert_eq!(s["status"], "recovering");
    assert_eq!(s["retry_count"], 1);
    assert_eq!(s["last_error"], "boom");
    assert_eq!(get(&state, "/frame/1").await.0, StatusCode::GONE);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let s = state_json(&state).await;
    assert_eq!(s["status"], "rendering");
    assert_eq!(s["generation"], 2);
    assert_eq!(get(&state, "/frame/2").await.0, StatusCode::OK);
}

#[tokio::test]
async fn chrome_controls_update_session() {
    let state = app_state();
    let s = post(&state, "/device", json!({"device": "tablet"})).await;
    assert_eq!(s["device"], "tablet");
    let s = post(&state, "/fullscreen", json!({})).await;
    assert_eq!(s["fullscreen"], true);
    let s = post(&state, "/fullscreen", json!({"fullscreen": false})).await;
    assert_eq!(s["fullscreen"], false);

    let s = post(&state, "/live", json!({"live": false})).await;
    assert_eq!(s["is_live"], false);
    let frozen = post(&state, "/refresh", json!({})).await;
    assert_eq!(frozen["generation"], 1);
    let s = post(&state, "/live", json!({"live": true})).await;
    assert_eq!(s["generation"], 2);
}

#[tokio::test]
async fn overrides_replace_file_content() {
    let state = app_state();
    let s = post(
        &state,
        "/files/override",
        json!({"name": "App.tsx", "content": "const App = () => <b>edited</b>;"}),
    )
    .await;
    assert_eq!(s["generation"], 2);

    let (status, body) = get(&state, "/files").await;
    assert_eq!(status, StatusCode::OK);
    let files: Vec<VirtualFile> = serde_json::from_str(&body).expect("files json");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content, "const App = () => <b>edited</b>;");
}
