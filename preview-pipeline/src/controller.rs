//! Preview controller and its auto-recovery loop.
//!
//! The controller is a synchronous state machine over a [`PreviewSession`].
//! Every input (file-set change, user action, sandbox notification, timer)
//! is one method call. Delays are not slept on here; a call that needs one
//! returns a [`Timer`], and the embedder calls [`PreviewController::on_timer`]
//! when it fires. Timers and notifications carry the generation they were
//! issued for, and anything from a superseded generation is ignored.
//!
//! ```text
//! Idle --files--> Rendering --ready--> Ready
//!                     |  \--error, retries left--> Recovering --timer--> Rendering
//!                     \----error, retries spent--> Failed --refresh--> Rendering
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PreviewConfig;
use crate::file::VirtualFile;
use crate::host::ExecutionHost;
use crate::protocol::Notification;
use crate::synth::{Document, PatchHint, Synthesizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewStatus {
    Idle,
    Rendering,
    Ready,
    Recovering,
    Failed,
}

/// Frame size presets for the preview chrome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfile {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl DeviceProfile {
    /// Fixed viewport in CSS pixels; desktop fills the pane.
    pub fn viewport(self) -> Option<(u32, u32)> {
        match self {
            Self::Mobile => Some((375, 667)),
            Self::Tablet => Some((768, 1024)),
            Self::Desktop => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
        }
    }
}

impl FromStr for DeviceProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mobile" => Ok(Self::Mobile),
            "tablet" => Ok(Self::Tablet),
            "desktop" => Ok(Self::Desktop),
            other => Err(format!("unknown device profile '{other}'")),
        }
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-mount preview state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewSession {
    pub files: Vec<VirtualFile>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub is_live: bool,
    pub last_error: Option<String>,
    pub ready: bool,
    pub device: DeviceProfile,
    pub fullscreen: bool,
    /// Bumped whenever the mounted host is torn down.
    pub generation: u64,
    pub status: PreviewStatus,
}

impl PreviewSession {
    fn new(max_retries: u32) -> Self {
        Self {
            files: Vec::new(),
            retry_count: 0,
            max_retries,
            is_live: true,
            last_error: None,
            ready: false,
            device: DeviceProfile::default(),
            fullscreen: false,
            generation: 0,
            status: PreviewStatus::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    /// Re-synthesize with patching after an error.
    Recovery,
    /// Give up waiting for the mounted document to report.
    Watchdog,
}

/// A delayed callback the embedder must schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub kind: TimerKind,
    pub generation: u64,
    pub delay: Duration,
}

pub struct PreviewController<H: ExecutionHost> {
    session: PreviewSession,
    synth: Synthesizer,
    host: H,
    recovery_delay: Duration,
    render_timeout: Option<Duration>,
    document: Option<Document>,
    pending_recovery: Option<u64>,
}

impl<H: ExecutionHost> PreviewController<H> {
    pub fn new(host: H, config: &PreviewConfig) -> Self {
        Self::with_synthesizer(host, Synthesizer::new(config), config)
    }

    pub fn with_synthesizer(host: H, synth: Synthesizer, config: &PreviewConfig) -> Self {
        Self {
            session: PreviewSession::new(config.max_retries),
            synth,
            host,
            recovery_delay: Duration::from_millis(config.recovery_delay_ms),
            render_timeout: config.render_timeout_ms.map(Duration::from_millis),
            document: None,
            pending_recovery: None,
        }
    }

    pub fn session(&self) -> &PreviewSession {
        &self.session
    }

    pub fn status(&self) -> PreviewStatus {
        self.session.status
    }

    /// Document currently mounted in the host, if any.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    // ── Events ────────────────────────────────────────────────────────

    /// A new file set. An empty set returns the session to `Idle`; an
    /// identical set is not a change. While frozen the files are stored
    /// and rendered when live mode returns.
    pub fn set_files(&mut self, files: Vec<VirtualFile>) -> Option<Timer> {
        if files == self.session.files && self.session.status != PreviewStatus::Idle {
            return None;
        }
        self.session.files = files;
        self.session.retry_count = 0;
        self.session.last_error = None;
        if self.session.files.is_empty() {
            self.go_idle();
            return None;
        }
        if !self.session.is_live {
            debug!(files = self.session.files.len(), "preview frozen, deferring render");
            return None;
        }
        self.render_fresh()
    }

    /// Replace one file's content as an editor override would.
    pub fn override_file(&mut self, name: &str, content: String) -> Option<Timer> {
        let mut overrides = std::collections::BTreeMap::new();
        overrides.insert(name.to_string(), content);
        let files = crate::file::apply_overrides(&self.session.files, &overrides);
        self.set_files(files)
    }

    /// Manual refresh: clears the retry budget and renders again. Ignored
    /// while frozen.
    pub fn refresh(&mut self) -> Option<Timer> {
        if !self.session.is_live {
            return None;
        }
        self.session.retry_count = 0;
        self.session.last_error = None;
        if self.session.files.is_empty() {
            self.go_idle();
            return None;
        }
        info!(generation = self.session.generation + 1, "manual refresh");
        self.render_fresh()
    }

    /// Freeze or unfreeze the preview. Freezing keeps the mounted output
    /// and cancels a pending recovery; unfreezing forces one refresh.
    pub fn set_live(&mut self, live: bool) -> Option<Timer> {
        if live == self.session.is_live {
            return None;
        }
        self.session.is_live = live;
        if live {
            info!("preview live");
            return self.refresh();
        }
        info!("preview frozen");
        self.pending_recovery = None;
        if self.session.status == PreviewStatus::Recovering {
            self.session.status = PreviewStatus::Failed;
        }
        None
    }

    pub fn set_device(&mut self, device: DeviceProfile) {
        self.session.device = device;
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.session.fullscreen = fullscreen;
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.session.fullscreen = !self.session.fullscreen;
        self.session.fullscreen
    }

    /// A notification posted by the frame of `generation`.
    pub fn handle_notification(
        &mut self,
        generation: u64,
        notification: Notification,
    ) -> Option<Timer> {
        if generation != self.session.generation {
            debug!(generation, current = self.session.generation, "ignoring stale notification");
            return None;
        }
        if !self.session.is_live || self.session.status != PreviewStatus::Rendering {
            debug!(status = ?self.session.status, "ignoring notification outside rendering");
            return None;
        }
        match notification {
            Notification::Ready => {
                info!(generation, "preview ready");
                self.session.status = PreviewStatus::Ready;
                self.session.ready = true;
                self.session.retry_count = 0;
                self.session.last_error = None;
                None
            }
            Notification::Error { error, .. } => self.fail(error),
        }
    }

    /// Raw JSON relayed from the frame; anything but the two notification
    /// shapes is dropped.
    pub fn handle_raw(&mut self, generation: u64, message: &serde_json::Value) -> Option<Timer> {
        match Notification::from_value(message) {
            Some(n) => self.handle_notification(generation, n),
            None => {
                debug!("ignoring unrecognised message");
                None
            }
        }
    }

    /// A timer returned earlier has fired.
    pub fn on_timer(&mut self, timer: Timer) -> Option<Timer> {
        if timer.generation != self.session.generation || !self.session.is_live {
            return None;
        }
        match timer.kind {
            TimerKind::Recovery => {
                if self.pending_recovery != Some(timer.generation)
                    || self.session.status != PreviewStatus::Recovering
                {
                    return None;
                }
                self.pending_recovery = None;
                let hint = PatchHint::retry(self.session.last_error.clone().unwrap_or_default());
                info!(
                    attempt = self.session.retry_count,
                    max = self.session.max_retries,
                    "re-synthesizing with patches"
                );
                self.mount(&hint)
            }
            TimerKind::Watchdog => {
                if self.session.status != PreviewStatus::Rendering {
                    return None;
                }
                let ms = timer.delay.as_millis();
                warn!(generation = timer.generation, "no notification within {ms} ms");
                self.fail(format!("preview timed out after {ms} ms"))
            }
        }
    }

    // ── Transitions ───────────────────────────────────────────────────

    fn fail(&mut self, error: String) -> Option<Timer> {
        self.session.ready = false;
        self.session.last_error = Some(error);
        if self.session.retry_count < self.session.max_retries {
            self.session.retry_count += 1;
            self.session.status = PreviewStatus::Recovering;
            self.advance_generation();
            self.pending_recovery = Some(self.session.generation);
            debug!(
                retry = self.session.retry_count,
                generation = self.session.generation,
                "scheduling recovery"
            );
            Some(Timer {
                kind: TimerKind::Recovery,
                generation: self.session.generation,
                delay: self.recovery_delay,
            })
        } else {
            warn!(
                retries = self.session.retry_count,
                error = self.session.last_error.as_deref().unwrap_or_default(),
                "preview failed, giving up"
            );
            self.session.status = PreviewStatus::Failed;
            None
        }
    }

    /// Tear down the mounted host and move to a new generation.
    fn advance_generation(&mut self) {
        self.session.generation += 1;
        self.pending_recovery = None;
        self.document = None;
        self.host.discard();
    }

    fn go_idle(&mut self) {
        self.advance_generation();
        self.session.status = PreviewStatus::Idle;
        self.session.ready = false;
        debug!("preview idle");
    }

    fn render_fresh(&mut self) -> Option<Timer> {
        self.advance_generation();
        self.mount(&PatchHint::none())
    }

    /// Synthesize and mount into the current generation.
    fn mount(&mut self, hint: &PatchHint) -> Option<Timer> {
        let doc = self.synth.build(&self.session.files, hint);
        if doc.is_empty() {
            debug!("nothing renderable in file set");
            self.session.status = PreviewStatus::Idle;
            self.session.ready = false;
            return None;
        }
        let generation = self.session.generation;
        debug!(
            generation,
            strategy = doc.strategy.as_str(),
            patches = ?doc.patches,
            "mounting document"
        );
        self.host.mount(generation, &doc.html);
        self.document = Some(doc);
        self.session.status = PreviewStatus::Rendering;
        self.session.ready = false;
        self.render_timeout.map(|delay| Timer {
            kind: TimerKind::Watchdog,
            generation,
            delay,
        })
    }
}
