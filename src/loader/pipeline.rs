//! Ordered script execution for one fragment.
//!
//! Attaching markup never runs scripts, so execution is an explicit pass over
//! the queue. Each unit finishes before the next starts; an external unit is
//! fetched first, and the next unit waits for that fetch.

use std::cell::RefCell;
use std::time::Duration;

use xinclude_types::{ScriptKind, ScriptRuntime, ScriptUnit};

use crate::fetch::{fetch_with_timeout, FragmentFetcher};

use super::script::ScriptBody;
use super::splice::QueuedScript;

/// Per-fragment script counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptTally {
    pub executed: usize,
    pub failed: usize,
    /// Data blocks, module scripts and anything not run because execution is off.
    pub skipped: usize,
}

impl ScriptTally {
    pub fn all_skipped(count: usize) -> Self {
        Self {
            skipped: count,
            ..Self::default()
        }
    }
}

pub async fn run_scripts(
    queue: &[QueuedScript],
    fetcher: &dyn FragmentFetcher,
    runtime: &RefCell<dyn ScriptRuntime>,
    include_source: &str,
    timeout: Option<Duration>,
) -> ScriptTally {
    let mut tally = ScriptTally::default();

    for (index, queued) in queue.iter().enumerate() {
        let descriptor = &queued.descriptor;
        match descriptor.kind {
            ScriptKind::Classic => {}
            ScriptKind::Data => {
                tally.skipped += 1;
                continue;
            }
            ScriptKind::Module => {
                tracing::warn!(
                    include = %include_source,
                    script = index + 1,
                    "Module scripts are not supported; skipping"
                );
                tally.skipped += 1;
                continue;
            }
        }

        let unit = match &descriptor.body {
            ScriptBody::Inline(code) => ScriptUnit::new(
                format!("{} (inline script {})", include_source, index + 1),
                code.clone(),
            ),
            ScriptBody::External(url) => match fetch_with_timeout(fetcher, url, timeout).await {
                Ok(code) => ScriptUnit::new(url.clone(), code),
                Err(error) => {
                    tracing::warn!(
                        include = %include_source,
                        script = %url,
                        error = %error,
                        "Script load failed"
                    );
                    tally.failed += 1;
                    continue;
                }
            },
        };

        let result = runtime.borrow_mut().execute(&unit);
        match result {
            Ok(()) => tally.executed += 1,
            Err(error) => {
                tracing::warn!(
                    include = %include_source,
                    script = %unit.origin,
                    error = %error,
                    "Script error"
                );
                tally.failed += 1;
            }
        }
    }

    tally
}
