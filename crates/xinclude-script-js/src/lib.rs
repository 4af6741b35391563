//! Built-in script runtime for xinclude, backed by `boa_engine`.

pub mod runtime;

pub use runtime::{BoaRuntimeConfig, BoaScriptRuntime, ConsoleLine};

// Re-export boa_engine for embedders that need direct access to the context
pub use boa_engine;
