//! Local dev host for the preview pipeline.
//!
//! Serves the controller chrome at `/` and the current generation's
//! document at `/frame/{generation}` inside a sandboxed iframe. The chrome
//! relays the frame's notifications to `POST /notify`. The input path is
//! watched; edits re-extract the file set and live-reload the page.

use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use notify::{Event, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tower_livereload::{LiveReloadLayer, Reloader};
use tracing::{debug, info, warn};

use crate::config::PreviewConfig;
use crate::controller::{DeviceProfile, PreviewController, PreviewStatus, Timer};
use crate::error::{PreviewError, Result};
use crate::file::{Language, VirtualFile};
use crate::host::ExecutionHost;
use crate::protocol::Envelope;
use crate::synth::Strategy;

mod css;
mod inline_js;
mod page;
mod toolbar;

pub type SharedState = Arc<Mutex<DevState>>;

pub struct DevState {
    /// Watched input, if the state was loaded from disk.
    pub input: Option<PathBuf>,
    pub config: PreviewConfig,
    pub controller: PreviewController<FrameHost>,
}

impl DevState {
    pub fn new(config: PreviewConfig, host: FrameHost, input: Option<PathBuf>) -> Self {
        let controller = PreviewController::new(host, &config);
        Self {
            input,
            config,
            controller,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}

/// Execution host backed by the `/frame/{generation}` route. Mounting
/// swaps the served document and reloads the chrome, whose fresh iframe
/// replaces the old browsing context.
#[derive(Default)]
pub struct FrameHost {
    frame: Option<(u64, String)>,
    reloader: Option<Reloader>,
}

impl FrameHost {
    pub fn new(reloader: Reloader) -> Self {
        Self {
            frame: None,
            reloader: Some(reloader),
        }
    }

    /// Document for `generation`, if it is the mounted one.
    pub fn frame(&self, generation: u64) -> Option<&str> {
        match &self.frame {
            Some((g, html)) if *g == generation => Some(html),
            _ => None,
        }
    }

    pub fn mounted_generation(&self) -> Option<u64> {
        self.frame.as_ref().map(|(g, _)| *g)
    }

    fn reload(&self) {
        if let Some(r) = &self.reloader {
            r.reload();
        }
    }
}

impl ExecutionHost for FrameHost {
    fn mount(&mut self, generation: u64, document: &str) {
        self.frame = Some((generation, document.to_string()));
        self.reload();
    }

    fn discard(&mut self) {
        if self.frame.take().is_some() {
            self.reload();
        }
    }
}

/// Start the dev server for a transcript, directory or file.
pub async fn run_dev_server(path: PathBuf, port: u16, config: PreviewConfig) -> Result<()> {
    let files = crate::input::load_input(&path, &config)?;

    let livereload = LiveReloadLayer::new();
    let host = FrameHost::new(livereload.reloader());
    let state = DevState::new(config, host, Some(path.clone())).shared();
    let timer = lock(&state)
        .map_err(|(_, e)| PreviewError::server(e))?
        .controller
        .set_files(files);
    schedule(&state, timer);

    // File watcher: notify's thread -> tokio task.
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();
    let watch_target = path.canonicalize().unwrap_or_else(|_| path.clone());
    let mut watcher = notify::recommended_watcher(move |res: std::result::Result<Event, _>| {
        if let Ok(event) = res {
            let relevant = event.kind.is_modify() || event.kind.is_create();
            if relevant && touches(&event, &watch_target) {
                let _ = tx.send(());
            }
        }
    })
    .map_err(PreviewError::server)?;
    let (watch_dir, mode) = if path.is_dir() {
        (path.as_path(), RecursiveMode::Recursive)
    } else {
        (
            path.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(FsPath::new(".")),
            RecursiveMode::NonRecursive,
        )
    };
    watcher
        .watch(watch_dir, mode)
        .map_err(PreviewError::server)?;

    let reload_state = Arc::clone(&state);
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Coalesce bursts of events from a single save.
            while rx.try_recv().is_ok() {}
            reload_input(&reload_state);
        }
    });

    let app = live_router(Arc::clone(&state), livereload);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    eprintln!("preview dev server");
    eprintln!("  input:   {}", path.display());
    eprintln!("  chrome:  http://localhost:{port}/");
    eprintln!("  export:  http://localhost:{port}/export");
    eprintln!("  watching for changes...");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PreviewError::server(format!("cannot bind {addr}: {e}")))?;
    axum::serve(listener, app)
        .await
        .map_err(PreviewError::server)?;

    // Keep watcher alive
    drop(watcher);
    Ok(())
}

/// Only the chrome page carries the live-reload script. Frames and
/// exports are served as the synthesized bytes.
pub fn is_chrome_request(req: &Request) -> bool {
    req.uri().path() == "/"
}

/// [`router`] wrapped in `layer`, injecting into the chrome page only.
pub fn live_router(state: SharedState, layer: LiveReloadLayer) -> Router {
    router(state).layer(layer.request_predicate(is_chrome_request))
}

/// Routes for a dev state, without live reload.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(serve_chrome))
        .route("/frame/{generation}", get(serve_frame))
        .route("/export", get(serve_export))
        .route("/state", get(serve_state))
        .route("/files", get(serve_files))
        .route("/files/override", post(serve_override))
        .route("/notify", post(serve_notify))
        .route("/refresh", post(serve_refresh))
        .route("/live", post(serve_live))
        .route("/device", post(serve_device))
        .route("/fullscreen", post(serve_fullscreen))
        .with_state(state)
}

// ── Shared helpers ────────────────────────────────────────────────────

type ApiError = (StatusCode, String);

fn lock(state: &SharedState) -> std::result::Result<MutexGuard<'_, DevState>, ApiError> {
    state
        .lock()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Lock error: {e}")))
}

/// Run a controller timer on tokio and feed it back when it fires.
fn schedule(state: &SharedState, timer: Option<Timer>) {
    let Some(timer) = timer else {
        return;
    };
    let state = Arc::clone(state);
    tokio::spawn(async move {
        tokio::time::sleep(timer.delay).await;
        let next = match state.lock() {
            Ok(mut s) => s.controller.on_timer(timer),
            Err(e) => {
                warn!("dropping timer, lock error: {e}");
                return;
            }
        };
        schedule(&state, next);
    });
}

fn touches(event: &Event, target: &FsPath) -> bool {
    event.paths.is_empty()
        || event
            .paths
            .iter()
            .any(|p| p.starts_with(target) || p.file_name() == target.file_name())
}

fn reload_input(state: &SharedState) {
    let (input, config) = match state.lock() {
        Ok(s) => match &s.input {
            Some(p) => (p.clone(), s.config.clone()),
            None => return,
        },
        Err(e) => {
            warn!("cannot reload input, lock error: {e}");
            return;
        }
    };
    let files = match crate::input::load_input(&input, &config) {
        Ok(f) => f,
        Err(e) => {
            warn!("keeping previous files: {e}");
            return;
        }
    };
    info!(files = files.len(), "input changed");
    let timer = match state.lock() {
        Ok(mut s) => s.controller.set_files(files),
        Err(_) => return,
    };
    schedule(state, timer);
}

// ── State view ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub language: Language,
    pub bytes: usize,
}

/// JSON view of the session served at `/state`.
#[derive(Debug, Serialize)]
pub struct StateView {
    pub status: PreviewStatus,
    pub generation: u64,
    pub retry_count: u32,
    pub max_retries: u32,
    pub is_live: bool,
    pub ready: bool,
    pub last_error: Option<String>,
    pub device: DeviceProfile,
    pub fullscreen: bool,
    pub strategy: Option<Strategy>,
    pub entry: Option<String>,
    pub patches: Vec<String>,
    pub files: Vec<FileSummary>,
}

impl StateView {
    fn of(state: &DevState) -> Self {
        let session = state.controller.session();
        let doc = state.controller.document();
        Self {
            status: session.status,
            generation: session.generation,
            retry_count: session.retry_count,
            max_retries: session.max_retries,
            is_live: session.is_live,
            ready: session.ready,
            last_error: session.last_error.clone(),
            device: session.device,
            fullscreen: session.fullscreen,
            strategy: doc.map(|d| d.strategy),
            entry: doc.and_then(|d| d.entry.clone()),
            patches: doc
                .map(|d| d.patches.iter().map(|p| p.to_string()).collect())
                .unwrap_or_default(),
            files: session
                .files
                .iter()
                .map(|f| FileSummary {
                    name: f.name.clone(),
                    language: f.language,
                    bytes: f.content.len(),
                })
                .collect(),
        }
    }
}

/// Apply a controller event and answer with the resulting state.
fn update(
    state: &SharedState,
    event: impl FnOnce(&mut PreviewController<FrameHost>) -> Option<Timer>,
) -> std::result::Result<Json<StateView>, ApiError> {
    let (timer, view) = {
        let mut guard = lock(state)?;
        let timer = event(&mut guard.controller);
        (timer, StateView::of(&guard))
    };
    schedule(state, timer);
    Ok(Json(view))
}

// ── Route handlers ────────────────────────────────────────────────────

/// Controller chrome: toolbar, status, file list and the sandboxed frame.
async fn serve_chrome(State(state): State<SharedState>) -> std::result::Result<Html<String>, ApiError> {
    let guard = lock(&state)?;
    let view = StateView::of(&guard);
    let mounted = guard.controller.host().mounted_generation();
    Ok(Html(page::build_chrome_page(
        &view,
        mounted,
        &guard.config.sandbox,
        &guard.config.title,
    )))
}

/// The mounted document, only for its own generation.
async fn serve_frame(
    State(state): State<SharedState>,
    Path(generation): Path<u64>,
) -> std::result::Result<Response, ApiError> {
    let guard = lock(&state)?;
    match guard.controller.host().frame(generation) {
        Some(html) => Ok((
            [(header::CACHE_CONTROL, "no-store")],
            Html(html.to_string()),
        )
            .into_response()),
        None => {
            debug!(generation, "request for superseded frame");
            Ok((StatusCode::GONE, "superseded generation").into_response())
        }
    }
}

/// The mounted document as a download, byte-identical to the frame.
async fn serve_export(State(state): State<SharedState>) -> std::result::Result<Response, ApiError> {
    let guard = lock(&state)?;
    let Some(generation) = guard.controller.host().mounted_generation() else {
        return Ok((StatusCode::NOT_FOUND, "nothing mounted").into_response());
    };
    let html = guard
        .controller
        .host()
        .frame(generation)
        .unwrap_or_default()
        .to_string();
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"preview.html\""),
        ],
        html,
    )
        .into_response())
}

async fn serve_state(State(state): State<SharedState>) -> std::result::Result<Json<StateView>, ApiError> {
    let guard = lock(&state)?;
    Ok(Json(StateView::of(&guard)))
}

async fn serve_files(
    State(state): State<SharedState>,
) -> std::result::Result<Json<Vec<VirtualFile>>, ApiError> {
    let guard = lock(&state)?;
    Ok(Json(guard.controller.session().files.clone()))
}

#[derive(Deserialize)]
struct OverrideRequest {
    name: String,
    content: String,
}

async fn serve_override(
    State(state): State<SharedState>,
    Json(req): Json<OverrideRequest>,
) -> std::result::Result<Json<StateView>, ApiError> {
    update(&state, |c| c.override_file(&req.name, req.content))
}

async fn serve_notify(
    State(state): State<SharedState>,
    Json(envelope): Json<Envelope>,
) -> std::result::Result<Json<StateView>, ApiError> {
    update(&state, |c| c.handle_raw(envelope.generation, &envelope.message))
}

async fn serve_refresh(State(state): State<SharedState>) -> std::result::Result<Json<StateView>, ApiError> {
    update(&state, |c| c.refresh())
}

#[derive(Deserialize)]
struct LiveRequest {
    live: bool,
}

async fn serve_live(
    State(state): State<SharedState>,
    Json(req): Json<LiveRequest>,
) -> std::result::Result<Json<StateView>, ApiError> {
    update(&state, |c| c.set_live(req.live))
}

#[derive(Deserialize)]
struct DeviceRequest {
    device: DeviceProfile,
}

async fn serve_device(
    State(state): State<SharedState>,
    Json(req): Json<DeviceRequest>,
) -> std::result::Result<Json<StateView>, ApiError> {
    update(&state, |c| {
        c.set_device(req.device);
        None
    })
}

#[derive(Deserialize)]
struct FullscreenRequest {
    /// Explicit value; toggles when absent.
    #[serde(default)]
    fullscreen: Option<bool>,
}

async fn serve_fullscreen(
    State(state): State<SharedState>,
    Json(req): Json<FullscreenRequest>,
) -> std::result::Result<Json<StateView>, ApiError> {
    update(&state, |c| {
        match req.fullscreen {
            Some(on) => c.set_fullscreen(on),
            None => {
                c.toggle_fullscreen();
            }
        }
        None
    })
}
