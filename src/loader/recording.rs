use xinclude_types::{ScriptError, ScriptRuntime, ScriptUnit};

use serde_json::Value;

/// A [`ScriptRuntime`] that only records what it was asked to run.
///
/// Useful when scripts must be hoisted but not evaluated, and in tests that
/// assert on execution order without a JavaScript engine.
#[derive(Debug, Default)]
pub struct RecordingRuntime {
    executed: Vec<ScriptUnit>,
    fail_marker: Option<String>,
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Units whose code contains `marker` fail with an execution error.
    pub fn failing_on(marker: impl Into<String>) -> Self {
        Self {
            executed: Vec::new(),
            fail_marker: Some(marker.into()),
        }
    }

    pub fn executed(&self) -> &[ScriptUnit] {
        &self.executed
    }

    /// Code of every recorded unit, in execution order.
    pub fn executed_code(&self) -> Vec<&str> {
        self.executed.iter().map(|u| u.code.as_str()).collect()
    }
}

impl ScriptRuntime for RecordingRuntime {
    fn execute(&mut self, unit: &ScriptUnit) -> Result<(), ScriptError> {
        self.executed.push(unit.clone());
        match &self.fail_marker {
            Some(marker) if unit.code.contains(marker.as_str()) => {
                Err(ScriptError::ExecutionError {
                    origin: unit.origin.clone(),
                    message: format!("recorded failure on '{}'", marker),
                })
            }
            _ => Ok(()),
        }
    }

    fn evaluate_json(&mut self, _expression: &str) -> Result<Value, ScriptError> {
        Err(ScriptError::Unsupported(
            "the recording runtime does not evaluate expressions".to_string(),
        ))
    }

    fn runtime_name(&self) -> &str {
        "recording"
    }
}
