/// Chrome stylesheet. `frame_width` is the device column width, `None`
/// for desktop.
pub(super) fn build_css(frame_width: Option<u32>) -> String {
    let stage_width = match frame_width {
        Some(w) => format!("{w}px"),
        None => "100%".to_string(),
    };
    format!(
        r#"* {{ margin: 0; padding: 0; box-sizing: border-box; }}
html, body {{ width: 100%; height: 100%; background: #0A0A0A; color: #A0A0A0;
  font-family: 'JetBrains Mono', monospace; font-size: 12px; }}

/* ── Toolbar ─────────────────────────────────────── */
.toolbar {{
  height: 36px; display: flex; align-items: center; padding: 0 14px;
  border-bottom: 1px solid #2A2A2A; font-size: 11px; gap: 10px;
  background: #0A0A0A; user-select: none;
}}
.toolbar .label {{ color: #666; }}
.toolbar .title {{ color: #D4AF37; font-weight: 600; }}
.toolbar .badge {{
  color: #A0A0A0; background: #1F1F1F; padding: 2px 8px;
  border-radius: 3px; font-size: 10px;
}}
.toolbar .sep {{ color: #333; }}
.toolbar .actions {{ margin-left: auto; display: flex; gap: 6px; }}
.toolbar button, .toolbar a.btn {{
  background: #1F1F1F; border: 1px solid #2A2A2A; color: #A0A0A0;
  padding: 3px 10px; border-radius: 3px; font-size: 10px; cursor: pointer;
  font-family: inherit; text-decoration: none; display: inline-flex;
  align-items: center;
}}
.toolbar button:hover, .toolbar a.btn:hover {{ color: #FFF; border-color: #444; }}
.toolbar button.active {{ color: #D4AF37; border-color: #D4AF37; }}

/* ── Status ──────────────────────────────────────── */
.status {{ padding: 2px 8px; border-radius: 3px; font-size: 10px; border: 1px solid #2A2A2A; }}
.status-idle {{ color: #666; }}
.status-rendering {{ color: #22D3EE; border-color: #22D3EE33; }}
.status-ready {{ color: #22C55E; border-color: #22C55E33; }}
.status-recovering {{ color: #F59E0B; border-color: #F59E0B33; }}
.status-failed {{ color: #EF4444; border-color: #EF444433; }}
.error-bar {{
  display: none; padding: 6px 14px; border-bottom: 1px solid #2A2A2A;
  background: rgba(239,68,68,0.06); color: #EF4444; font-size: 11px;
  white-space: pre-wrap; word-break: break-word;
}}
.error-bar.visible {{ display: block; }}
.error-bar .retry {{ color: #F59E0B; margin-left: 8px; }}

/* ── Layout ──────────────────────────────────────── */
.split {{
  display: grid; grid-template-columns: 220px 1fr;
  height: calc(100vh - 36px);
}}
.files {{ border-right: 1px solid #2A2A2A; overflow-y: auto; padding: 10px 0; }}
.files-title {{
  font-size: 10px; color: #444; text-transform: uppercase;
  letter-spacing: 1px; padding: 0 14px 6px;
}}
.file-row {{
  display: flex; justify-content: space-between; gap: 8px;
  padding: 3px 14px; font-size: 11px;
}}
.file-row.entry .file-name {{ color: #D4AF37; }}
.file-lang {{ color: #444; font-size: 10px; }}
.patches {{ padding: 10px 14px; font-size: 10px; color: #F59E0B; }}
.stage {{
  position: relative; overflow: auto; display: flex;
  align-items: flex-start; justify-content: center; background: #141414;
}}
.stage-inner {{ width: {stage_width}; height: 100%; background: #FFF; }}
iframe {{ border: none; display: block; background: #FFF; }}
.placeholder {{
  margin: 80px auto; color: #666; font-size: 11px;
  display: flex; align-items: center; gap: 8px;
}}
.pulse-dot {{
  width: 6px; height: 6px; border-radius: 50%; background: #D4AF37;
  animation: pulse 2s ease-in-out infinite;
}}
@keyframes pulse {{
  0%, 100% {{ opacity: 0.3; }}
  50% {{ opacity: 1; }}
}}

/* ── Fullscreen ──────────────────────────────────── */
body.fullscreen .files, body.fullscreen .error-bar {{ display: none; }}
body.fullscreen .split {{ grid-template-columns: 1fr; }}"#
    )
}
