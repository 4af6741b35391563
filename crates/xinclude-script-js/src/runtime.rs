//! Page-global JavaScript runtime using boa_engine.
//!
//! One [`Context`] lives for the whole page, so globals written by one script
//! are visible to every later one, the way scripts share `window` in a browser.
//! `console.*` calls are buffered inside the realm and forwarded to `tracing`
//! after each unit.

use boa_engine::{Context, Source};
use serde_json::Value;

use xinclude_types::{ScriptError, ScriptRuntime, ScriptUnit};

const PRELUDE: &str = r#"
var window = globalThis;
var self = globalThis;
var __console_logs = [];
var console = (function () {
    function emit(level, args) {
        var parts = [];
        for (var i = 0; i < args.length; i++) {
            var arg = args[i];
            if (typeof arg === 'object' && arg !== null) {
                try { parts.push(JSON.stringify(arg)); } catch (e) { parts.push(String(arg)); }
            } else {
                parts.push(String(arg));
            }
        }
        __console_logs.push({ level: level, text: parts.join(' ') });
    }
    return {
        log: function () { emit('info', arguments); },
        info: function () { emit('info', arguments); },
        debug: function () { emit('debug', arguments); },
        warn: function () { emit('warn', arguments); },
        error: function () { emit('error', arguments); }
    };
})();
"#;

/// Boa runtime configuration
#[derive(Clone, Debug)]
pub struct BoaRuntimeConfig {
    /// Max code length (bytes) of a single unit
    pub max_code_length: usize,

    /// Whether `console.*` output is forwarded to tracing
    pub enable_console: bool,

    /// Abort loops after this many iterations
    pub loop_iteration_limit: Option<u64>,
}

impl Default for BoaRuntimeConfig {
    fn default() -> Self {
        Self {
            max_code_length: 1_000_000, // 1MB
            enable_console: true,
            loop_iteration_limit: None,
        }
    }
}

/// One buffered `console.*` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub level: String,
    pub text: String,
}

pub struct BoaScriptRuntime {
    context: Context,
    config: BoaRuntimeConfig,
    console_history: Vec<ConsoleLine>,
}

impl BoaScriptRuntime {
    pub fn new(config: BoaRuntimeConfig) -> Result<Self, ScriptError> {
        let mut context = Context::default();

        if let Some(limit) = config.loop_iteration_limit {
            context.runtime_limits_mut().set_loop_iteration_limit(limit);
        }

        context
            .eval(Source::from_bytes(PRELUDE))
            .map_err(|e| ScriptError::InternalError(format!("Failed to install prelude: {}", e)))?;

        Ok(Self {
            context,
            config,
            console_history: Vec::new(),
        })
    }

    /// Every console line seen so far, oldest first.
    pub fn console_history(&self) -> &[ConsoleLine] {
        &self.console_history
    }

    fn drain_console(&mut self) {
        let drained = self
            .context
            .eval(Source::from_bytes("JSON.stringify(__console_logs.splice(0))"));
        let raw = match drained {
            Ok(value) => value.as_string().map(|s| s.to_std_string_escaped()),
            Err(e) => {
                tracing::debug!(error = %e, "console buffer unavailable");
                None
            }
        };
        let Some(raw) = raw else {
            return;
        };

        let entries: Vec<Value> = serde_json::from_str(&raw).unwrap_or_default();
        for entry in entries {
            let level = entry
                .get("level")
                .and_then(Value::as_str)
                .unwrap_or("info")
                .to_string();
            let text = entry
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            if self.config.enable_console {
                match level.as_str() {
                    "debug" => tracing::debug!(target: "xinclude::console", "{}", text),
                    "warn" => tracing::warn!(target: "xinclude::console", "{}", text),
                    "error" => tracing::error!(target: "xinclude::console", "{}", text),
                    _ => tracing::info!(target: "xinclude::console", "{}", text),
                }
            }
            self.console_history.push(ConsoleLine { level, text });
        }
    }
}

impl ScriptRuntime for BoaScriptRuntime {
    fn execute(&mut self, unit: &ScriptUnit) -> Result<(), ScriptError> {
        if unit.code.len() > self.config.max_code_length {
            return Err(ScriptError::Unsupported(format!(
                "{} is {} bytes (max {})",
                unit.origin,
                unit.code.len(),
                self.config.max_code_length
            )));
        }

        let result = self.context.eval(Source::from_bytes(&unit.code));
        self.drain_console();

        result.map(|_| ()).map_err(|e| ScriptError::ExecutionError {
            origin: unit.origin.clone(),
            message: e.to_string(),
        })
    }

    fn evaluate_json(&mut self, expression: &str) -> Result<Value, ScriptError> {
        let code = format!("JSON.stringify(({}))", expression);
        let result = self
            .context
            .eval(Source::from_bytes(&code))
            .map_err(|e| ScriptError::ExecutionError {
                origin: "evaluate_json".to_string(),
                message: e.to_string(),
            })?;

        match result.as_string() {
            Some(s) => serde_json::from_str(&s.to_std_string_escaped())
                .map_err(|e| ScriptError::SerializationError(e.to_string())),
            None => Ok(Value::Null),
        }
    }

    fn runtime_name(&self) -> &str {
        "boa"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn runtime() -> BoaScriptRuntime {
        BoaScriptRuntime::new(BoaRuntimeConfig::default()).unwrap()
    }

    #[test]
    fn test_globals_persist_between_units() {
        let mut rt = runtime();
        rt.execute(&ScriptUnit::new("a", "window.counter = 1;")).unwrap();
        rt.execute(&ScriptUnit::new("b", "counter += 41;")).unwrap();
        assert_eq!(rt.evaluate_json("window.counter").unwrap(), json!(42));
    }

    #[test]
    fn test_order_array_scenario() {
        let mut rt = runtime();
        for i in 1..=3 {
            let code = format!("window.__order=(window.__order||[]).concat({})", i);
            rt.execute(&ScriptUnit::new(format!("s{}", i), code)).unwrap();
        }
        assert_eq!(rt.evaluate_json("window.__order").unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_undefined_projects_to_null() {
        let mut rt = runtime();
        assert_eq!(rt.evaluate_json("window.missing").unwrap(), Value::Null);
    }

    #[test]
    fn test_thrown_error_is_reported_with_origin() {
        let mut rt = runtime();
        let err = rt
            .execute(&ScriptUnit::new("/js/broken.js", "throw new Error('boom');"))
            .unwrap_err();
        match err {
            ScriptError::ExecutionError { origin, message } => {
                assert_eq!(origin, "/js/broken.js");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_console_lines_are_captured() {
        let mut rt = runtime();
        rt.execute(&ScriptUnit::new(
            "inline",
            "console.log('hello', {a: 1}); console.warn('careful');",
        ))
        .unwrap();
        let history = rt.console_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].level, "info");
        assert_eq!(history[0].text, "hello {\"a\":1}");
        assert_eq!(history[1].level, "warn");
    }

    #[test]
    fn test_console_is_drained_even_when_unit_throws() {
        let mut rt = runtime();
        let _ = rt.execute(&ScriptUnit::new("inline", "console.error('before'); null.x;"));
        assert_eq!(rt.console_history().len(), 1);
        assert_eq!(rt.console_history()[0].text, "before");
    }

    #[test]
    fn test_code_too_large() {
        let mut rt = BoaScriptRuntime::new(BoaRuntimeConfig {
            max_code_length: 8,
            ..BoaRuntimeConfig::default()
        })
        .unwrap();
        let err = rt
            .execute(&ScriptUnit::new("big", "var x = 'too long';"))
            .unwrap_err();
        assert!(matches!(err, ScriptError::Unsupported(_)));
    }

    #[test]
    fn test_loop_iteration_limit() {
        let mut rt = BoaScriptRuntime::new(BoaRuntimeConfig {
            loop_iteration_limit: Some(1_000),
            ..BoaRuntimeConfig::default()
        })
        .unwrap();
        let result = rt.execute(&ScriptUnit::new("spin", "while (true) {}"));
        assert!(result.is_err());
    }
}
