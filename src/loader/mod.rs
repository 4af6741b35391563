//! Fragment include loader.
//!
//! Finds inclusion points (elements carrying the include attribute), fetches
//! every fragment concurrently on the calling task, and splices each one as
//! soon as its payload arrives. Scripts in a fragment are re-created in the
//! execution region and run in fragment order; scripts of different
//! fragments are not ordered relative to each other.
//!
//! A failing fragment never fails the load. It is replaced by a visible
//! marker, logged, and reported in the [`LoadReport`].

pub mod pipeline;
pub mod recording;
pub mod script;
pub mod splice;

use std::cell::RefCell;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use xinclude_types::ScriptRuntime;

use crate::config::LoaderConfig;
use crate::dom::{Document, NodeId};
use crate::error::RetrievalError;
use crate::fetch::{fetch_with_timeout, FragmentFetcher};

pub use pipeline::ScriptTally;
pub use recording::RecordingRuntime;
pub use script::{ScriptBody, ScriptDescriptor};
pub use splice::QueuedScript;

/// A discovered inclusion point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionPoint {
    pub node: NodeId,
    pub source: String,
}

/// Terminal state of one inclusion point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeState {
    Spliced { scripts: ScriptTally },
    Failed(RetrievalError),
    /// Empty source; left untouched.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeOutcome {
    pub node: NodeId,
    pub source: String,
    pub state: IncludeState,
}

impl IncludeOutcome {
    pub fn is_spliced(&self) -> bool {
        matches!(self.state, IncludeState::Spliced { .. })
    }

    pub fn error(&self) -> Option<&RetrievalError> {
        match &self.state {
            IncludeState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Outcome of every inclusion point, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub outcomes: Vec<IncludeOutcome>,
}

impl LoadReport {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn spliced(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_spliced()).count()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == IncludeState::Skipped)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &IncludeOutcome> {
        self.outcomes.iter().filter(|o| o.error().is_some())
    }

    /// Script counts summed over every spliced fragment.
    pub fn script_totals(&self) -> ScriptTally {
        self.outcomes
            .iter()
            .fold(ScriptTally::default(), |mut acc, o| {
                if let IncludeState::Spliced { scripts } = &o.state {
                    acc.executed += scripts.executed;
                    acc.failed += scripts.failed;
                    acc.skipped += scripts.skipped;
                }
                acc
            })
    }
}

pub struct FragmentLoader {
    fetcher: Arc<dyn FragmentFetcher>,
    config: LoaderConfig,
}

impl FragmentLoader {
    pub fn new(fetcher: Arc<dyn FragmentFetcher>, config: LoaderConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Current inclusion points, in document order. Directives that arrived
    /// inside a spliced fragment are not inclusion points.
    pub fn discover(&self, document: &Document) -> Vec<InclusionPoint> {
        document
            .select_by_attribute(&self.config.attribute)
            .into_iter()
            .filter(|node| !document.is_inside_fragment(*node))
            .map(|node| InclusionPoint {
                node,
                source: document
                    .attr(node, &self.config.attribute)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect()
    }

    /// Load every inclusion point and resolve once each one is spliced or
    /// failed. Scripts are hoisted but not run when `runtime` is `None` or
    /// script execution is disabled.
    pub async fn load(
        &self,
        document: &RefCell<Document>,
        runtime: Option<&RefCell<dyn ScriptRuntime>>,
    ) -> LoadReport {
        let points = self.discover(&document.borrow());
        if points.is_empty() {
            return LoadReport::default();
        }

        tracing::debug!(
            count = points.len(),
            fetcher = %self.fetcher.describe(),
            "Loading includes"
        );

        let semaphore = self.config.concurrency_limit().map(Semaphore::new);
        let runtime = runtime.filter(|_| self.config.execute_scripts);

        let pending = points
            .into_iter()
            .map(|point| self.load_one(point, document, runtime, semaphore.as_ref()));
        let outcomes = join_all(pending).await;

        LoadReport { outcomes }
    }

    async fn load_one(
        &self,
        point: InclusionPoint,
        document: &RefCell<Document>,
        runtime: Option<&RefCell<dyn ScriptRuntime>>,
        semaphore: Option<&Semaphore>,
    ) -> IncludeOutcome {
        let InclusionPoint { node, source } = point;
        if source.trim().is_empty() {
            return IncludeOutcome {
                node,
                source,
                state: IncludeState::Skipped,
            };
        }

        let payload = {
            let _permit = match semaphore {
                Some(semaphore) => semaphore.acquire().await.ok(),
                None => None,
            };
            fetch_with_timeout(self.fetcher.as_ref(), &source, self.config.fetch_timeout()).await
        };

        let state = match payload {
            Ok(text) => {
                let queue = splice::splice_fragment(
                    &mut document.borrow_mut(),
                    node,
                    &text,
                    &self.config.attribute,
                );
                let scripts = match runtime {
                    Some(runtime) if !queue.is_empty() => {
                        pipeline::run_scripts(
                            &queue,
                            self.fetcher.as_ref(),
                            runtime,
                            &source,
                            self.config.fetch_timeout(),
                        )
                        .await
                    }
                    _ => ScriptTally::all_skipped(queue.len()),
                };
                tracing::debug!(
                    source = %source,
                    executed = scripts.executed,
                    failed = scripts.failed,
                    "Include spliced"
                );
                IncludeState::Spliced { scripts }
            }
            Err(error) => {
                tracing::error!(source = %source, error = %error, "Include failed");
                splice::mark_failed(
                    &mut document.borrow_mut(),
                    node,
                    &source,
                    &self.config.attribute,
                    &self.config.failure_marker_style,
                );
                IncludeState::Failed(error)
            }
        };

        IncludeOutcome {
            node,
            source,
            state,
        }
    }
}
