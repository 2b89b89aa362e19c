//! Preview configuration, loadable from a JSON file via `--config`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PreviewError, Result};

/// Pipeline settings. Every field has a default, so a config file only
/// names what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Automatic re-syntheses before a session gives up.
    pub max_retries: u32,
    /// Delay before a recovery re-synthesis.
    pub recovery_delay_ms: u64,
    /// Silence after mount that counts as a failure. `None` waits forever.
    pub render_timeout_ms: Option<u64>,
    /// Characters before a fence searched for a filename.
    pub lookback_chars: usize,
    pub runtime: RuntimeUrls,
    pub sandbox: SandboxPolicy,
    /// `<title>` of synthesized documents.
    pub title: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            recovery_delay_ms: 1000,
            render_timeout_ms: None,
            lookback_chars: crate::extract::DEFAULT_LOOKBACK,
            runtime: RuntimeUrls::default(),
            sandbox: SandboxPolicy::default(),
            title: "Preview".to_string(),
        }
    }
}

impl PreviewConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PreviewError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| PreviewError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `load` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

/// External runtimes referenced (never bundled) by synthesized documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeUrls {
    /// UI runtime.
    pub react: String,
    /// DOM bindings for the UI runtime.
    pub react_dom: String,
    /// In-browser transpiler for JSX and TypeScript.
    pub babel: String,
    /// Styling utility.
    pub tailwind: String,
}

impl Default for RuntimeUrls {
    fn default() -> Self {
        Self {
            react: "https://unpkg.com/react@18/umd/react.development.js".to_string(),
            react_dom: "https://unpkg.com/react-dom@18/umd/react-dom.development.js".to_string(),
            babel: "https://unpkg.com/@babel/standalone@7.26.0/babel.min.js".to_string(),
            tailwind: "https://cdn.tailwindcss.com".to_string(),
        }
    }
}

/// Capabilities granted to the sandbox frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxPolicy {
    pub capabilities: Vec<String>,
}

/// Granting this would let the frame reach the host page's origin.
const SAME_ORIGIN: &str = "allow-same-origin";

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            capabilities: ["allow-scripts", "allow-forms", "allow-modals", "allow-popups"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl SandboxPolicy {
    /// Value for the frame's `sandbox` attribute. `allow-same-origin` is
    /// always dropped and `allow-scripts` is always present.
    pub fn attribute(&self) -> String {
        let mut caps: Vec<&str> = Vec::new();
        for cap in &self.capabilities {
            let cap = cap.trim();
            if cap.is_empty() || cap.eq_ignore_ascii_case(SAME_ORIGIN) || caps.contains(&cap) {
                continue;
            }
            caps.push(cap);
        }
        if !caps.contains(&"allow-scripts") {
            caps.insert(0, "allow-scripts");
        }
        caps.join(" ")
    }
}
