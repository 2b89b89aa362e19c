use crate::controller::{DeviceProfile, PreviewStatus};
use crate::escape::html_escape;

use super::StateView;

const DEVICES: [DeviceProfile; 3] = [
    DeviceProfile::Mobile,
    DeviceProfile::Tablet,
    DeviceProfile::Desktop,
];

fn status_label(status: PreviewStatus) -> &'static str {
    match status {
        PreviewStatus::Idle => "idle",
        PreviewStatus::Rendering => "rendering",
        PreviewStatus::Ready => "ready",
        PreviewStatus::Recovering => "recovering",
        PreviewStatus::Failed => "failed",
    }
}

pub(super) fn build_toolbar(view: &StateView, title: &str) -> String {
    let status = status_label(view.status);
    let strategy = view.strategy.map(|s| s.as_str()).unwrap_or("none");

    let mut devices = String::new();
    for d in DEVICES {
        let active = if d == view.device { " active" } else { "" };
        devices.push_str(&format!(
            r#"<button class="device{active}" data-device="{name}">{name}</button>"#,
            name = d.as_str(),
        ));
    }

    let live_label = if view.is_live { "live" } else { "frozen" };
    let live_class = if view.is_live { " active" } else { "" };
    let fs_class = if view.fullscreen { " active" } else { "" };

    format!(
        r#"<div class="toolbar">
  <span class="title">{title}</span>
  <span class="sep">|</span>
  <span class="status status-{status}" id="status">{status}</span>
  <span class="badge" id="strategy">{strategy}</span>
  <span class="label" id="generation">gen {generation}</span>
  <div class="actions">
    {devices}
    <button id="live-btn" class="{live_class}">{live_label}</button>
    <button id="refresh-btn">refresh</button>
    <button id="fullscreen-btn" class="{fs_class}">fullscreen</button>
    <a class="btn" href="/export" download="preview.html">export</a>
  </div>
</div>"#,
        title = html_escape(title),
        generation = view.generation,
        live_class = live_class.trim(),
        fs_class = fs_class.trim(),
    )
}

pub(super) fn build_error_bar(view: &StateView) -> String {
    let Some(error) = &view.last_error else {
        return r#"<div class="error-bar" id="error-bar"></div>"#.to_string();
    };
    let retry = match view.status {
        PreviewStatus::Recovering => format!(
            r#"<span class="retry">retrying {}/{}</span>"#,
            view.retry_count, view.max_retries
        ),
        PreviewStatus::Failed => r#"<span class="retry">gave up, refresh to retry</span>"#.to_string(),
        _ => String::new(),
    };
    format!(
        r#"<div class="error-bar visible" id="error-bar">{}{retry}</div>"#,
        html_escape(error)
    )
}

pub(super) fn build_file_list(view: &StateView) -> String {
    let mut rows = String::new();
    for f in &view.files {
        let entry = if view.entry.as_deref() == Some(f.name.as_str()) {
            " entry"
        } else {
            ""
        };
        rows.push_str(&format!(
            r#"<div class="file-row{entry}"><span class="file-name">{name}</span><span class="file-lang">{lang}</span></div>"#,
            name = html_escape(&f.name),
            lang = f.language.as_str(),
        ));
    }
    if rows.is_empty() {
        rows.push_str(r#"<div class="file-row"><span class="file-lang">no files</span></div>"#);
    }
    let patches = if view.patches.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="patches">patched: {}</div>"#,
            html_escape(&view.patches.join(", "))
        )
    };
    format!(
        r#"<div class="files">
  <div class="files-title">files</div>
  {rows}
  {patches}
</div>"#
    )
}
