//! Module declarations and the registry that holds them until linked.
//!
//! A module is registered with a name, its dependency names and a
//! [`Definition`] selecting one of two styles:
//!
//! - **Declarative**: a [`Setup`] that, given an [`Exporter`], returns a
//!   [`Declaration`] of per-dependency setters and an execute body. Exports
//!   are live bindings pushed to importers.
//! - **Dynamic**: a body that pulls its dependencies through a [`Require`]
//!   handle at run time and produces one opaque exports value.
//!
//! Linking consumes the setup/body but leaves the entry in place so that
//! cycles can observe it was already started.

use std::fmt;
use std::rc::Rc;

use modlink_value::{Namespace, Value};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::{LoadError, LoadResult};
use crate::exporter::Exporter;
use crate::records::RecordId;
use crate::require::{ModuleHandle, Require};

/// Callback receiving a dependency's exports.
pub type Setter = Rc<dyn Fn(&Value)>;

/// Body of a declarative module, run once after its dependencies.
pub type ExecuteFn = Box<dyn FnOnce() -> LoadResult<()>>;

/// Body of a dynamic module.
///
/// Receives the lookup handle, the freshly allocated exports namespace and
/// the module handle. A returned value replaces the exports wholesale.
pub type DynamicBody = Box<dyn FnOnce(&Require, &Namespace, &ModuleHandle) -> LoadResult<Option<Value>>>;

/// Execution style of a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleStyle {
    /// Static dependency list, live-binding exports.
    Declarative,
    /// Runtime lookups, one opaque exports value.
    Dynamic,
}

impl ModuleStyle {
    /// The other style.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            ModuleStyle::Declarative => ModuleStyle::Dynamic,
            ModuleStyle::Dynamic => ModuleStyle::Declarative,
        }
    }
}

impl fmt::Display for ModuleStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleStyle::Declarative => f.write_str("declarative"),
            ModuleStyle::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// What the setup of a declarative module hands back to the linker.
///
/// Both the setter list and the execute body are required; a declaration
/// missing either is rejected when the module is linked. Setters are
/// positional: the `i`th setter receives the exports of the `i`th declared
/// dependency. A skipped position is simply not notified.
#[derive(Default)]
pub struct Declaration {
    setters: Option<Vec<Option<Setter>>>,
    execute: Option<ExecuteFn>,
}

impl Declaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an empty setter list (a module without dependencies).
    #[must_use]
    pub fn no_setters(mut self) -> Self {
        self.setters.get_or_insert_with(Vec::new);
        self
    }

    /// Append the setter for the next dependency position.
    #[must_use]
    pub fn setter(mut self, setter: impl Fn(&Value) + 'static) -> Self {
        self.setters
            .get_or_insert_with(Vec::new)
            .push(Some(Rc::new(setter)));
        self
    }

    /// Leave the next dependency position without a setter.
    #[must_use]
    pub fn skip_setter(mut self) -> Self {
        self.setters.get_or_insert_with(Vec::new).push(None);
        self
    }

    /// Set the execute body.
    #[must_use]
    pub fn execute(mut self, body: impl FnOnce() -> LoadResult<()> + 'static) -> Self {
        self.execute = Some(Box::new(body));
        self
    }

    /// Split into setters and body, or `None` if either is missing.
    pub(crate) fn into_parts(self) -> Option<(Vec<Option<Setter>>, ExecuteFn)> {
        Some((self.setters?, self.execute?))
    }
}

/// Setup function of a declarative module.
pub enum Setup {
    /// Takes no exporter; only valid for modules without dependencies.
    Nullary(Box<dyn FnOnce() -> Declaration>),
    /// Takes the module's exporter.
    WithExporter(Box<dyn FnOnce(Exporter) -> Declaration>),
}

impl Setup {
    pub(crate) fn invoke(self, exporter: Exporter) -> Declaration {
        match self {
            Setup::Nullary(setup) => setup(),
            Setup::WithExporter(setup) => setup(exporter),
        }
    }
}

/// Style selector plus body, as passed to [`Loader::register`](crate::Loader::register).
pub enum Definition {
    Declarative(Setup),
    Dynamic {
        body: DynamicBody,
        /// When set, the body resolves its dependencies itself through
        /// `require`; otherwise registered dynamic dependencies are linked
        /// (and run) before the body.
        executing_require: bool,
    },
}

impl Definition {
    /// Declarative module whose setup receives an exporter.
    pub fn declarative(setup: impl FnOnce(Exporter) -> Declaration + 'static) -> Self {
        Definition::Declarative(Setup::WithExporter(Box::new(setup)))
    }

    /// Declarative module whose setup takes no exporter.
    pub fn declarative_nullary(setup: impl FnOnce() -> Declaration + 'static) -> Self {
        Definition::Declarative(Setup::Nullary(Box::new(setup)))
    }

    /// Dynamic module whose registered dependencies run before its body.
    pub fn dynamic(
        body: impl FnOnce(&Require, &Namespace, &ModuleHandle) -> LoadResult<Option<Value>> + 'static,
    ) -> Self {
        Definition::Dynamic {
            body: Box::new(body),
            executing_require: false,
        }
    }

    /// Dynamic module that resolves its dependencies on demand.
    pub fn dynamic_executing_require(
        body: impl FnOnce(&Require, &Namespace, &ModuleHandle) -> LoadResult<Option<Value>> + 'static,
    ) -> Self {
        Definition::Dynamic {
            body: Box::new(body),
            executing_require: true,
        }
    }

    pub fn style(&self) -> ModuleStyle {
        match self {
            Definition::Declarative(_) => ModuleStyle::Declarative,
            Definition::Dynamic { .. } => ModuleStyle::Dynamic,
        }
    }
}

/// Style-specific state of a registry entry.
///
/// The `record`/`module` slot is `None` until linking starts and doubles as
/// the "already started" guard.
pub(crate) enum EntryKind {
    Declarative {
        setup: Option<Setup>,
        record: Option<RecordId>,
    },
    Dynamic {
        body: Option<DynamicBody>,
        executing_require: bool,
        module: Option<Rc<ModuleHandle>>,
    },
}

/// A registered module that has not finished loading.
pub(crate) struct Entry {
    /// Ordered, de-duplicated dependency names.
    pub(crate) deps: Rc<[String]>,
    pub(crate) evaluated: bool,
    pub(crate) kind: EntryKind,
}

impl Entry {
    fn new(deps: Rc<[String]>, definition: Definition) -> Self {
        let kind = match definition {
            Definition::Declarative(setup) => EntryKind::Declarative {
                setup: Some(setup),
                record: None,
            },
            Definition::Dynamic {
                body,
                executing_require,
            } => EntryKind::Dynamic {
                body: Some(body),
                executing_require,
                module: None,
            },
        };
        Entry {
            deps,
            evaluated: false,
            kind,
        }
    }

    pub(crate) fn style(&self) -> ModuleStyle {
        match self.kind {
            EntryKind::Declarative { .. } => ModuleStyle::Declarative,
            EntryKind::Dynamic { .. } => ModuleStyle::Dynamic,
        }
    }

    /// Whether linking has started for this entry.
    pub(crate) fn is_linked(&self) -> bool {
        match &self.kind {
            EntryKind::Declarative { record, .. } => record.is_some(),
            EntryKind::Dynamic { module, .. } => module.is_some(),
        }
    }

    pub(crate) fn record(&self) -> Option<RecordId> {
        match self.kind {
            EntryKind::Declarative { record, .. } => record,
            EntryKind::Dynamic { .. } => None,
        }
    }

    pub(crate) fn module_handle(&self) -> Option<Rc<ModuleHandle>> {
        match &self.kind {
            EntryKind::Dynamic { module, .. } => module.clone(),
            EntryKind::Declarative { .. } => None,
        }
    }
}

/// Remove duplicate names, keeping the first occurrence of each.
fn dedupe(deps: &[&str]) -> Rc<[String]> {
    let mut seen = FxHashSet::default();
    deps.iter()
        .filter(|dep| seen.insert(**dep))
        .map(|dep| (*dep).to_owned())
        .collect()
}

/// Table of declared, not yet fully loaded modules.
#[derive(Default)]
pub(crate) struct Registry {
    entries: FxHashMap<String, Entry>,
}

impl Registry {
    /// Validate and store a declaration.
    ///
    /// Returns `Ok(false)` without touching the table when `name` is
    /// already declared: the first registration wins.
    pub(crate) fn declare(
        &mut self,
        name: &str,
        deps: &[&str],
        definition: Definition,
    ) -> LoadResult<bool> {
        if name.is_empty() {
            return Err(LoadError::InvalidName);
        }
        let deps = dedupe(deps);
        if matches!(definition, Definition::Declarative(Setup::Nullary(_))) && !deps.is_empty() {
            return Err(LoadError::setup_arity(name, deps.len()));
        }
        if self.entries.contains_key(name) {
            return Ok(false);
        }
        self.entries
            .insert(name.to_owned(), Entry::new(deps, definition));
        Ok(true)
    }

    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    #[inline]
    pub(crate) fn get_key_value(&self, name: &str) -> Option<(&String, &Entry)> {
        self.entries.get_key_value(name)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries.get_mut(name)
    }

    #[inline]
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Entry> {
        self.entries.remove(name)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn style_of(&self, name: &str) -> Option<ModuleStyle> {
        self.get(name).map(Entry::style)
    }
}
