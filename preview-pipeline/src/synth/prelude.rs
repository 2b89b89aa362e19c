//! Notification prelude shared by every synthesized document.
//!
//! Installs `window.__preview` with one-shot `ready()` / `fail(err)` and
//! global error listeners. The first call settles the generation; later
//! calls are dropped, so a document reports at most one outcome.

/// The prelude script body. Must run before any user code.
pub const NOTIFY_PRELUDE: &str = r#"(function () {
  var settled = false;
  function post(msg) {
    try { window.parent.postMessage(msg, '*'); } catch (e) {}
  }
  function showPanel(message, stack) {
    var render = function () {
      var host = document.getElementById('root') || document.body;
      if (!host) return;
      var panel = document.createElement('div');
      panel.className = '__preview-error';
      var title = document.createElement('strong');
      title.textContent = 'Preview error';
      var body = document.createElement('pre');
      body.textContent = stack ? message + '\n\n' + stack : message;
      panel.appendChild(title);
      panel.appendChild(body);
      host.innerHTML = '';
      host.appendChild(panel);
    };
    if (document.body) render();
    else document.addEventListener('DOMContentLoaded', render);
  }
  window.__preview = {
    ready: function () {
      if (settled) return;
      settled = true;
      post({ type: 'preview-ready' });
    },
    fail: function (err) {
      if (settled) return;
      settled = true;
      var message = err && err.message ? String(err.message) : String(err);
      var stack = err && err.stack ? String(err.stack) : undefined;
      var msg = { type: 'preview-error', error: message };
      if (stack) msg.stack = stack;
      post(msg);
      showPanel(message, stack);
    }
  };
  window.addEventListener('error', function (e) {
    window.__preview.fail(e.error || e.message);
  });
  window.addEventListener('unhandledrejection', function (e) {
    window.__preview.fail(e.reason);
  });
})();"#;

/// Stylesheet for the inline error panel.
pub const PANEL_CSS: &str = r#".__preview-error {
  margin: 16px;
  padding: 12px 16px;
  border: 1px solid #f5a3a3;
  border-radius: 6px;
  background: #fff1f1;
  color: #8a1c1c;
  font-family: ui-monospace, SFMono-Regular, Menlo, monospace;
  font-size: 12px;
}
.__preview-error pre {
  margin: 8px 0 0;
  white-space: pre-wrap;
  word-break: break-word;
}"#;

/// `<script>` element for the prelude, ready to splice into a document.
pub fn prelude_tag() -> String {
    format!("<script>{NOTIFY_PRELUDE}</script>\n<style>{PANEL_CSS}</style>")
}
