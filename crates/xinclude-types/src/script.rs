use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// How a script element asks to be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    /// Classic script (no `type`, or a JavaScript MIME type).
    Classic,
    /// `type="module"`.
    Module,
    /// Any other `type`; a data block that is never evaluated.
    Data,
}

impl ScriptKind {
    /// Classify the value of a script element's `type` attribute.
    pub fn from_type_attr(value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return ScriptKind::Classic;
        };
        let essence = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "" => ScriptKind::Classic,
            "module" => ScriptKind::Module,
            "text/javascript"
            | "application/javascript"
            | "application/ecmascript"
            | "application/x-javascript"
            | "application/x-ecmascript"
            | "text/ecmascript"
            | "text/jscript"
            | "text/livescript"
            | "text/x-javascript"
            | "text/x-ecmascript" => ScriptKind::Classic,
            _ => ScriptKind::Data,
        }
    }
}

/// One unit of code handed to a [`ScriptRuntime`].
#[derive(Debug, Clone)]
pub struct ScriptUnit {
    /// Where the code came from, used in diagnostics.
    pub origin: String,
    /// Source text.
    pub code: String,
}

impl ScriptUnit {
    pub fn new(origin: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            code: code.into(),
        }
    }
}

/// Script runtime errors
#[derive(Debug, Clone, Error)]
pub enum ScriptError {
    #[error("Execution error in {origin}: {message}")]
    ExecutionError { origin: String, message: String },

    #[error("Unsupported script: {0}")]
    Unsupported(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A global script-execution context shared by every script on a page.
///
/// Units run to completion synchronously; callers decide the order.
pub trait ScriptRuntime {
    /// Evaluate one unit in the page's global scope.
    fn execute(&mut self, unit: &ScriptUnit) -> Result<(), ScriptError>;

    /// Evaluate an expression and return its JSON projection.
    ///
    /// Values that have no JSON form (e.g. `undefined`) come back as `Null`.
    fn evaluate_json(&mut self, expression: &str) -> Result<Value, ScriptError>;

    /// Runtime name, for logs.
    fn runtime_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_kind_classification() {
        assert_eq!(ScriptKind::from_type_attr(None), ScriptKind::Classic);
        assert_eq!(ScriptKind::from_type_attr(Some("")), ScriptKind::Classic);
        assert_eq!(
            ScriptKind::from_type_attr(Some("text/javascript")),
            ScriptKind::Classic
        );
        assert_eq!(
            ScriptKind::from_type_attr(Some(" Text/JavaScript; charset=utf-8")),
            ScriptKind::Classic
        );
        assert_eq!(ScriptKind::from_type_attr(Some("module")), ScriptKind::Module);
        assert_eq!(
            ScriptKind::from_type_attr(Some("application/ld+json")),
            ScriptKind::Data
        );
        assert_eq!(
            ScriptKind::from_type_attr(Some("text/template")),
            ScriptKind::Data
        );
    }
}
