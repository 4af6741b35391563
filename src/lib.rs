//! # xinclude: client-side HTML include loader
//!
//! `xinclude` composes a page from reusable HTML fragments. Every element
//! carrying `data-include="<source>"` is replaced by the body of the fragment
//! at `<source>`:
//!
//! - **Concurrent loading**: all fragments are requested at once; each is
//!   spliced the moment its payload arrives.
//! - **Script activation**: scripts inside a fragment are re-created in the
//!   document head and run through a [`ScriptRuntime`] in fragment order.
//! - **Failure isolation**: a fragment that cannot be retrieved is replaced
//!   by a visible marker and never aborts the rest of the load.
//! - **Host behaviors**: clock, theme preference, lazy images and reveal
//!   animations are applied once loading settles.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xinclude::{Document, FragmentLoader, FsFetcher, LoaderConfig, Page};
//!
//! #[tokio::main]
//! async fn main() {
//!     let html = std::fs::read_to_string("site/index.html").unwrap();
//!     let loader = FragmentLoader::new(Arc::new(FsFetcher::new("site")), LoaderConfig::default());
//!     let page = Page::new(Document::parse(&html), loader);
//!     let report = page.init().await;
//!     println!("{} spliced, {} failed", report.load.spliced(), report.load.failed());
//!     println!("{}", page.document().to_html());
//! }
//! ```
//!
//! # Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `builtin-script-js` | Bundles the JavaScript runtime (Boa engine) |

pub mod config;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod page;
pub mod storage;

pub use config::{load_config, parse_config, AppConfig, ConfigFormat, LoaderConfig, PageConfig};
pub use dom::{Document, NodeId};
pub use error::{BehaviorError, InitError, RetrievalError};
pub use fetch::{FragmentFetcher, FsFetcher, HttpFetchConfig, HttpFetcher, MemoryFetcher};
pub use loader::{FragmentLoader, IncludeOutcome, IncludeState, InclusionPoint, LoadReport};
pub use page::{InitReport, Page};
pub use storage::Storage;
pub use xinclude_types::{ScriptError, ScriptKind, ScriptRuntime, ScriptUnit};

#[cfg(feature = "builtin-script-js")]
pub use xinclude_script_js::{BoaRuntimeConfig, BoaScriptRuntime};
