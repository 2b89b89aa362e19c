use crate::config::SandboxPolicy;
use crate::controller::PreviewStatus;
use crate::escape::html_escape;
use crate::host::frame_markup;

use super::css::build_css;
use super::inline_js::build_inline_js;
use super::toolbar::{build_error_bar, build_file_list, build_toolbar};
use super::StateView;

pub(super) fn build_chrome_page(
    view: &StateView,
    mounted: Option<u64>,
    sandbox: &SandboxPolicy,
    title: &str,
) -> String {
    let css = build_css(view.device.viewport().map(|(w, _)| w));
    let toolbar = build_toolbar(view, title);
    let error_bar = build_error_bar(view);
    let file_list = build_file_list(view);
    let stage = match mounted {
        Some(generation) => frame_markup(&format!("/frame/{generation}"), sandbox, view.device),
        None => build_placeholder(view),
    };
    let inline_js = build_inline_js(mounted, view.generation);
    let body_class = if view.fullscreen { "fullscreen" } else { "" };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  {css}
</style>
</head>
<body class="{body_class}">
{toolbar}
{error_bar}
<div class="split">
  {file_list}
  <div class="stage">
    <div class="stage-inner">
      {stage}
    </div>
  </div>
</div>
{inline_js}
</body>
</html>"##,
        title = html_escape(title),
    )
}

fn build_placeholder(view: &StateView) -> String {
    let message = if view.status == PreviewStatus::Recovering {
        format!("recovering, attempt {}/{}...", view.retry_count, view.max_retries)
    } else if view.files.is_empty() {
        "waiting for code blocks...".to_string()
    } else if view.is_live {
        "nothing renderable in these files".to_string()
    } else {
        "preview frozen".to_string()
    };
    format!(
        r#"<div class="placeholder"><div class="pulse-dot"></div>{message}</div>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::DeviceProfile;
    use crate::server::FileSummary;
    use crate::file::Language;
    use crate::synth::Strategy;

    fn view() -> StateView {
        StateView {
            status: PreviewStatus::Recovering,
            generation: 4,
            retry_count: 1,
            max_retries: 3,
            is_live: true,
            ready: false,
            last_error: Some("<Foo> is not defined".into()),
            device: DeviceProfile::Mobile,
            fullscreen: false,
            strategy: Some(Strategy::Component),
            entry: Some("App.tsx".into()),
            patches: vec!["rename-to-canonical".into()],
            files: vec![FileSummary {
                name: "App.tsx".into(),
                language: Language::Tsx,
                bytes: 10,
            }],
        }
    }

    #[test]
    fn chrome_embeds_sandboxed_frame_for_mounted_generation() {
        let html = build_chrome_page(&view(), Some(4), &SandboxPolicy::default(), "Preview");
        assert!(html.contains(r#"src="/frame/4""#));
        assert!(html.contains("sandbox=\"allow-scripts"));
        assert!(html.contains("width:375px"));
        assert!(html.contains("status-recovering"));
        assert!(html.contains("retrying 1/3"));
        assert!(html.contains("&lt;Foo&gt; is not defined"));
        assert!(html.contains("rename-to-canonical"));
        assert!(html.contains(r#"class="file-row entry""#));
    }

    #[test]
    fn chrome_without_frame_shows_placeholder() {
        let mut v = view();
        v.files.clear();
        v.last_error = None;
        v.status = PreviewStatus::Idle;
        let html = build_chrome_page(&v, None, &SandboxPolicy::default(), "<T>");
        assert!(!html.contains("<iframe"));
        assert!(html.contains("waiting for code blocks"));
        assert!(html.contains("<title>&lt;T&gt;</title>"));
    }

    #[test]
    fn recovering_without_frame_says_so() {
        let html = build_chrome_page(&view(), None, &SandboxPolicy::default(), "Preview");
        assert!(!html.contains("<iframe"));
        assert!(html.contains("recovering, attempt 1/3..."));
        assert!(!html.contains("nothing renderable"));
    }
}
