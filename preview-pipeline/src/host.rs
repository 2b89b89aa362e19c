//! Sandboxed execution host seam.
//!
//! The controller never runs documents itself. It hands each generation's
//! document to an [`ExecutionHost`], which must load it into a fresh
//! isolated context and throw the previous one away.

use crate::config::SandboxPolicy;
use crate::controller::DeviceProfile;
use crate::escape::html_escape;

pub trait ExecutionHost {
    /// Load `document` as `generation`, replacing whatever was mounted.
    fn mount(&mut self, generation: u64, document: &str);

    /// Drop the current context without mounting a replacement.
    fn discard(&mut self);
}

/// Host that only remembers what it was asked to show. Used by the CLI's
/// dry runs and by tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryHost {
    pub mounted: Option<(u64, String)>,
    /// Every generation mounted, in order.
    pub mounts: Vec<u64>,
    pub discards: usize,
}

impl ExecutionHost for MemoryHost {
    fn mount(&mut self, generation: u64, document: &str) {
        self.mounts.push(generation);
        self.mounted = Some((generation, document.to_string()));
    }

    fn discard(&mut self) {
        if self.mounted.take().is_some() {
            self.discards += 1;
        }
    }
}

/// `<iframe>` markup for a sandboxed frame loading `src`.
///
/// The sandbox attribute never grants same-origin access, so the frame has
/// an opaque origin and can only talk to the page through `postMessage`.
pub fn frame_markup(src: &str, policy: &SandboxPolicy, device: DeviceProfile) -> String {
    let style = match device.viewport() {
        Some((w, h)) => format!("width:{w}px;height:{h}px"),
        None => "width:100%;height:100%".to_string(),
    };
    format!(
        r#"<iframe id="preview-frame" title="Preview" src="{src}" sandbox="{sandbox}" referrerpolicy="no-referrer" style="{style}"></iframe>"#,
        src = html_escape(src),
        sandbox = html_escape(&policy.attribute()),
    )
}
