//! The public loader.
//!
//! `Loader` owns every table of the module system: the registry of
//! declarations, the arena of module records and the cache of resolved
//! exports. It is a cheap-to-clone handle; clones share the same state.
//!
//! # Load Pipeline
//!
//! ```text
//! load(name)
//!   ├── cache hit?                  → return memoized value
//!   ├── link(name)                  grouping, then groups farthest-first
//!   ├── ensure_evaluated(name, {})  declarative bodies, depth-first
//!   ├── registry.remove(name)
//!   └── expose + memoize            namespace / default envelope
//! ```
//!
//! # Re-entrancy
//!
//! Module code (setups, setters, bodies) runs with no table borrowed, so
//! it may call back into the loader: dynamic bodies look dependencies up,
//! exporters notify importers, and undeclared dependencies trigger nested
//! loads.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use modlink_value::{Namespace, Value};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::LoaderConfig;
use crate::errors::{LoadError, LoadResult};
use crate::records::RecordTable;
use crate::registry::{Definition, Entry, EntryKind, ModuleStyle, Registry};

/// Shared state behind a [`Loader`].
pub(crate) struct LoaderState {
    pub(crate) config: LoaderConfig,
    pub(crate) registry: RefCell<Registry>,
    pub(crate) records: RefCell<RecordTable>,
    /// Externally visible exports of resolved modules.
    pub(crate) cache: RefCell<FxHashMap<String, Value>>,
}

/// Registers modules and loads them by name.
///
/// All operations are synchronous and single-threaded.
#[derive(Clone)]
pub struct Loader {
    pub(crate) state: Rc<LoaderState>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// Create a loader with the default configuration.
    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default())
    }

    pub fn with_config(config: LoaderConfig) -> Self {
        let mut cache = FxHashMap::default();
        if let Some(empty) = &config.empty_module {
            cache.insert(empty.clone(), Value::Namespace(Namespace::new()));
        }
        Loader {
            state: Rc::new(LoaderState {
                config,
                registry: RefCell::new(Registry::default()),
                records: RefCell::new(RecordTable::default()),
                cache: RefCell::new(cache),
            }),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.state.config
    }

    /// Declare a module.
    ///
    /// Dependency names are de-duplicated, keeping first occurrences. The
    /// first declaration of a name wins: re-declaring a declared or already
    /// resolved name is a no-op reported as `Ok(false)`.
    ///
    /// # Errors
    ///
    /// - `InvalidName` for an empty name
    /// - `SetupArity` for a nullary declarative setup with dependencies
    pub fn register(&self, name: &str, deps: &[&str], definition: Definition) -> LoadResult<bool> {
        if self.is_resolved(name) {
            tracing::debug!(module = name, "already resolved; registration ignored");
            return Ok(false);
        }
        let style = definition.style();
        let stored = self
            .state
            .registry
            .borrow_mut()
            .declare(name, deps, definition)?;
        if stored {
            tracing::trace!(module = name, %style, deps = deps.len(), "registered");
        } else {
            tracing::debug!(module = name, "already declared; registration ignored");
        }
        Ok(stored)
    }

    /// Resolve `name` to its externally visible exports.
    ///
    /// Declarative modules expose their live namespace; dynamic modules
    /// expose their exports wrapped in a default envelope. The result is
    /// memoized: later calls return the identical value without running
    /// any body again.
    ///
    /// # Errors
    ///
    /// `ModuleNotFound` if `name` is neither resolved nor declared, or any
    /// error raised while linking or evaluating its dependency graph.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn load(&self, name: &str) -> LoadResult<Value> {
        if let Some(value) = self.resolved(name) {
            return Ok(value);
        }
        if !self.is_declared(name) {
            tracing::debug!(module = name, "neither resolved nor declared");
            return Err(LoadError::not_found(name));
        }

        self.link(name)?;
        self.ensure_evaluated(name, &mut FxHashSet::default())?;

        let entry = self.state.registry.borrow_mut().remove(name);
        let Some(entry) = entry else {
            return self.resolved(name).ok_or_else(|| LoadError::not_found(name));
        };
        let value = self.expose(name, &entry)?;

        let mut cache = self.state.cache.borrow_mut();
        let value = cache.entry(name.to_owned()).or_insert(value).clone();
        tracing::debug!(module = name, "resolved");
        Ok(value)
    }

    /// Place a host-supplied value directly into the module cache.
    ///
    /// The module is resolved from then on; no linking is involved.
    ///
    /// # Errors
    ///
    /// `InvalidName` for an empty name, `AlreadyResolved` if `name` is
    /// already in the cache.
    pub fn seed(&self, name: &str, value: Value) -> LoadResult<()> {
        if name.is_empty() {
            return Err(LoadError::InvalidName);
        }
        let mut cache = self.state.cache.borrow_mut();
        if cache.contains_key(name) {
            return Err(LoadError::already_resolved(name));
        }
        cache.insert(name.to_owned(), value);
        Ok(())
    }

    /// Load each entry-point module in order.
    ///
    /// Stops at the first failure.
    #[tracing::instrument(level = "debug", skip_all, fields(count = mains.len()))]
    pub fn bootstrap(&self, mains: &[&str]) -> LoadResult<Vec<Value>> {
        mains.iter().map(|main| self.load(main)).collect()
    }

    /// Whether `name` has a pending declaration.
    pub fn is_declared(&self, name: &str) -> bool {
        self.state.registry.borrow().contains(name)
    }

    /// Whether `name` is in the module cache.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.state.cache.borrow().contains_key(name)
    }

    /// Cached exports of `name`, without loading anything.
    pub fn resolved(&self, name: &str) -> Option<Value> {
        self.state.cache.borrow().get(name).cloned()
    }

    pub(crate) fn downgrade(&self) -> Weak<LoaderState> {
        Rc::downgrade(&self.state)
    }

    /// Style of a pending declaration.
    pub(crate) fn style_of(&self, name: &str) -> Option<ModuleStyle> {
        self.state.registry.borrow().style_of(name)
    }

    /// Shape in which a dynamic module's exports reach anything outside it.
    ///
    /// Wrapped in a default envelope, unless they are an `ES_MODULE`
    /// namespace and the configuration honours that flag. Importers linked
    /// against the module and later `load` calls both go through here.
    pub(crate) fn wrap_dynamic_exports(&self, exports: Value) -> Value {
        let es_module = self.state.config.honor_es_module_flag
            && exports.as_namespace().is_some_and(Namespace::is_es_module);
        if es_module {
            exports
        } else {
            Value::Namespace(Namespace::default_envelope(exports))
        }
    }

    /// Externally visible shape of a finished module.
    fn expose(&self, name: &str, entry: &Entry) -> LoadResult<Value> {
        match &entry.kind {
            EntryKind::Declarative {
                record: Some(record),
                ..
            } => Ok(Value::Namespace(
                self.state.records.borrow().get(*record).exports.clone(),
            )),
            EntryKind::Dynamic {
                module: Some(module),
                ..
            } => Ok(self.wrap_dynamic_exports(module.exports())),
            // Linking always starts the requested module.
            EntryKind::Declarative { record: None, .. } | EntryKind::Dynamic { module: None, .. } => {
                Err(LoadError::invalid_declaration(name))
            }
        }
    }
}
