//! WASM bindings for the preview pipeline.
//!
//! Exposes extraction, normalization, patching and synthesis to JavaScript
//! via wasm-bindgen, so a browser host can run the controller loop itself.
//! Build with: `wasm-pack build --target web --features wasm`

use wasm_bindgen::prelude::*;

use crate::extract::{ChatMessage, Extractor};
use crate::file::VirtualFile;
use crate::synth::{PatchHint, Synthesizer};

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// Extract virtual files from a `[{role, content}]` message array.
///
/// Returns an array of `{name, language, content}`.
#[wasm_bindgen]
pub fn extract_files(messages: JsValue, lookback: Option<usize>) -> Result<JsValue, JsError> {
    let messages: Vec<ChatMessage> = serde_wasm_bindgen::from_value(messages).map_err(js_error)?;
    let extractor = Extractor::new(lookback.unwrap_or(crate::extract::DEFAULT_LOOKBACK));
    let files = extractor.extract(&messages);
    serde_wasm_bindgen::to_value(&files).map_err(js_error)
}

/// Rewrite a component source to the canonical entry point.
#[wasm_bindgen]
pub fn normalize_source(source: &str) -> String {
    crate::normalize::normalize(source)
}

/// Apply the auto-patch rules for `error` to `source`.
///
/// Returns `{source, applied}` where `applied` lists the rules that fired.
#[wasm_bindgen]
pub fn patch_source(source: &str, error: &str) -> JsValue {
    let outcome = crate::patch::apply_rules(source, error);
    let obj = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&obj, &"source".into(), &JsValue::from_str(&outcome.source));
    let applied = js_sys::Array::new();
    for name in &outcome.applied {
        applied.push(&JsValue::from_str(name));
    }
    let _ = js_sys::Reflect::set(&obj, &"applied".into(), &applied.into());
    obj.into()
}

/// Synthesize the document for a `[{name, content}]` file array.
///
/// Pass `last_error` to request a patched recovery attempt. Returns
/// `{strategy, html, entry, patches}`; `html` is empty when nothing is
/// renderable.
#[wasm_bindgen]
pub fn synthesize_document(files: JsValue, last_error: Option<String>) -> Result<JsValue, JsError> {
    #[derive(serde::Deserialize)]
    struct FileInput {
        name: String,
        content: String,
    }

    let inputs: Vec<FileInput> = serde_wasm_bindgen::from_value(files).map_err(js_error)?;
    let files: Vec<VirtualFile> = inputs
        .into_iter()
        .map(|f| VirtualFile::new(f.name, f.content))
        .collect();
    let hint = last_error.map(PatchHint::retry).unwrap_or_default();
    let doc = Synthesizer::default().build(&files, &hint);
    serde_wasm_bindgen::to_value(&doc).map_err(js_error)
}
