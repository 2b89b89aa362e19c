/// Chrome script: relays frame notifications to `/notify` tagged with the
/// frame's generation, drives the toolbar and polls `/state`.
pub(super) fn build_inline_js(mounted: Option<u64>, generation: u64) -> String {
    let frame_gen = match mounted {
        Some(g) => g.to_string(),
        None => "null".to_string(),
    };
    format!(
        r##"<script>
(function() {{
  var FRAME_GEN = {frame_gen};
  var PAGE_GEN = {generation};
  var frame = document.getElementById('preview-frame');
  var state = null;

  function post(path, body) {{
    return fetch(path, {{
      method: 'POST',
      headers: {{ 'Content-Type': 'application/json' }},
      body: JSON.stringify(body || {{}})
    }}).then(function(r) {{ return r.ok ? r.json() : null; }})
      .then(function(s) {{ if (s) apply(s); return s; }})
      .catch(function() {{ return null; }});
  }}

  function apply(s) {{
    state = s;
    if (s.generation !== PAGE_GEN) {{ location.reload(); return; }}
    var badge = document.getElementById('status');
    badge.textContent = s.status;
    badge.className = 'status status-' + s.status;
    var bar = document.getElementById('error-bar');
    if (s.last_error) {{
      bar.textContent = s.last_error;
      if (s.status === 'recovering') bar.textContent += '  retrying ' + s.retry_count + '/' + s.max_retries;
      bar.classList.add('visible');
    }} else {{
      bar.textContent = '';
      bar.classList.remove('visible');
    }}
    var live = document.getElementById('live-btn');
    live.textContent = s.is_live ? 'live' : 'frozen';
    live.classList.toggle('active', s.is_live);
    document.getElementById('fullscreen-btn').classList.toggle('active', s.fullscreen);
    document.body.classList.toggle('fullscreen', s.fullscreen);
  }}

  // Relay: only the current frame's messages, tagged with its generation.
  window.addEventListener('message', function(e) {{
    if (!frame || FRAME_GEN === null || e.source !== frame.contentWindow) return;
    post('/notify', {{ generation: FRAME_GEN, message: e.data }});
  }});

  document.querySelectorAll('button.device').forEach(function(btn) {{
    btn.addEventListener('click', function() {{
      post('/device', {{ device: btn.dataset.device }}).then(function() {{ location.reload(); }});
    }});
  }});
  document.getElementById('live-btn').addEventListener('click', function() {{
    post('/live', {{ live: !(state ? state.is_live : true) }});
  }});
  document.getElementById('refresh-btn').addEventListener('click', function() {{
    post('/refresh');
  }});
  document.getElementById('fullscreen-btn').addEventListener('click', function() {{
    post('/fullscreen', {{}});
  }});
  document.addEventListener('keydown', function(e) {{
    if (e.key === 'Escape' && state && state.fullscreen) post('/fullscreen', {{ fullscreen: false }});
  }});

  function poll() {{
    fetch('/state').then(function(r) {{ return r.json(); }}).then(apply).catch(function() {{}});
  }}
  poll();
  setInterval(poll, 1000);
}})();
</script>"##
    )
}
