pub mod script;

pub use script::{ScriptError, ScriptKind, ScriptRuntime, ScriptUnit};
