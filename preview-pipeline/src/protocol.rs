//! Notification channel wire format.
//!
//! A sandboxed document reports exactly two shapes to its host:
//! `{"type":"preview-ready"}` and
//! `{"type":"preview-error","error":"...","stack":"..."}` (stack optional).
//! Anything else is not a notification and is dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    #[serde(rename = "preview-ready")]
    Ready,
    #[serde(rename = "preview-error")]
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
            stack: None,
        }
    }

    /// Parse a posted message, returning `None` for any other shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// A relayed notification tagged with the generation of the frame that
/// posted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub generation: u64,
    pub message: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_the_two_shapes() {
        assert_eq!(Notification::from_value(&json!({"type": "preview-ready"})), Some(Notification::Ready));
        assert_eq!(
            Notification::from_value(&json!({"type": "preview-error", "error": "boom", "stack": "at x"})),
            Some(Notification::Error {
                error: "boom".into(),
                stack: Some("at x".into())
            })
        );
        assert_eq!(
            Notification::from_value(&json!({"type": "preview-error", "error": "boom", "stack": null})),
            Some(Notification::error("boom"))
        );
    }

    #[test]
    fn ignores_other_shapes() {
        for value in [
            json!(null),
            json!("preview-ready"),
            json!({"type": "ready"}),
            json!({"type": "preview-error"}),
            json!({"type": "preview-error", "error": 42}),
            json!({"kind": "preview-ready"}),
            json!([{"type": "preview-ready"}]),
        ] {
            assert_eq!(Notification::from_value(&value), None, "{value}");
        }
        assert_eq!(Notification::parse("{not json"), None);
    }

    #[test]
    fn serializes_wire_shape() {
        let text = serde_json::to_string(&Notification::error("x")).expect("serialize");
        assert_eq!(text, r#"{"type":"preview-error","error":"x"}"#);
        let text = serde_json::to_string(&Notification::Ready).expect("serialize");
        assert_eq!(text, r#"{"type":"preview-ready"}"#);
    }
}
