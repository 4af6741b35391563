//! Error types for the include loader and page initializer.
//!
//! - [`RetrievalError`]: Failure to retrieve one fragment or external script.
//! - [`BehaviorError`]: A host behavior could not be installed.
//! - [`InitError`]: Top-level initialization fault.

pub mod init_error;
pub mod retrieval_error;

pub use init_error::{BehaviorError, InitError};
pub use retrieval_error::RetrievalError;

/// Convenience alias for retrieval results.
pub type RetrievalResult<T> = Result<T, RetrievalError>;
