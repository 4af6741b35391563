//! Top-level page initializer.
//!
//! [`Page::init`] runs once per document: it marks the body as loading,
//! loads every include, installs the host behaviors in order and then flips
//! the body to `loaded`. A behavior fault leaves the body without either
//! class.

pub mod behaviors;
pub mod time;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use xinclude_types::ScriptRuntime;

use crate::config::PageConfig;
use crate::dom::Document;
use crate::error::InitError;
use crate::loader::{FragmentLoader, LoadReport};
use crate::storage::Storage;

pub use behaviors::{
    toggle_theme, validate_form, validate_forms, Behavior, Clock, LazyImages, RevealAnimations,
    ThemePreference,
};
pub use time::{FakeTimeProvider, RealTimeProvider, TimeProvider};

/// Read-only services handed to each behavior.
pub struct PageContext<'a> {
    pub storage: &'a Storage,
    pub time: &'a dyn TimeProvider,
    pub config: &'a PageConfig,
}

#[derive(Debug)]
pub struct InitReport {
    pub load: LoadReport,
    pub result: Result<(), InitError>,
}

impl InitReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Behaviors enabled by `config`, in installation order.
pub fn default_behaviors(config: &PageConfig) -> Vec<Box<dyn Behavior>> {
    let mut behaviors: Vec<Box<dyn Behavior>> = Vec::new();
    if config.clock {
        behaviors.push(Box::new(Clock));
    }
    if config.theme {
        behaviors.push(Box::new(ThemePreference));
    }
    if config.lazy_images {
        behaviors.push(Box::new(LazyImages));
    }
    if config.reveal_animations {
        behaviors.push(Box::new(RevealAnimations));
    }
    behaviors
}

pub struct Page {
    document: RefCell<Document>,
    loader: FragmentLoader,
    runtime: Option<Rc<RefCell<dyn ScriptRuntime>>>,
    storage: Storage,
    time: Arc<dyn TimeProvider>,
    config: PageConfig,
    behaviors: Vec<Box<dyn Behavior>>,
}

impl Page {
    pub fn new(document: Document, loader: FragmentLoader) -> Self {
        let config = PageConfig::default();
        Self {
            document: RefCell::new(document),
            loader,
            runtime: None,
            storage: Storage::in_memory(),
            time: Arc::new(RealTimeProvider),
            behaviors: default_behaviors(&config),
            config,
        }
    }

    pub fn with_runtime(mut self, runtime: Rc<RefCell<dyn ScriptRuntime>>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_time_provider(mut self, time: Arc<dyn TimeProvider>) -> Self {
        self.time = time;
        self
    }

    /// Replaces the config and resets the behavior list to its defaults.
    pub fn with_config(mut self, config: PageConfig) -> Self {
        self.behaviors = default_behaviors(&config);
        self.config = config;
        self
    }

    pub fn with_behavior(mut self, behavior: Box<dyn Behavior>) -> Self {
        self.behaviors.push(behavior);
        self
    }

    pub async fn init(&self) -> InitReport {
        {
            let mut doc = self.document.borrow_mut();
            if let Some(body) = doc.body() {
                doc.add_class(body, "loading");
            }
        }

        let load = self
            .loader
            .load(&self.document, self.runtime.as_deref())
            .await;

        let result = self.install_behaviors();

        let mut doc = self.document.borrow_mut();
        let body = doc.body();
        match &result {
            Ok(()) => {
                if let Some(body) = body {
                    doc.remove_class(body, "loading");
                    doc.add_class(body, "loaded");
                }
                tracing::info!(
                    includes = load.outcomes.len(),
                    failed = load.failed(),
                    "Page initialized successfully"
                );
            }
            Err(error) => {
                tracing::error!(error = %error, "Error initializing page");
                if let Some(body) = body {
                    doc.remove_class(body, "loading");
                }
            }
        }

        InitReport { load, result }
    }

    fn install_behaviors(&self) -> Result<(), InitError> {
        let ctx = PageContext {
            storage: &self.storage,
            time: self.time.as_ref(),
            config: &self.config,
        };
        let mut doc = self.document.borrow_mut();
        for behavior in &self.behaviors {
            behavior
                .install(&mut doc, &ctx)
                .map_err(|source| InitError::Behavior {
                    name: behavior.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    pub fn document(&self) -> std::cell::Ref<'_, Document> {
        self.document.borrow()
    }

    pub fn document_mut(&self) -> std::cell::RefMut<'_, Document> {
        self.document.borrow_mut()
    }

    pub fn into_document(self) -> Document {
        self.document.into_inner()
    }

    pub fn runtime(&self) -> Option<&Rc<RefCell<dyn ScriptRuntime>>> {
        self.runtime.as_ref()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }
}
