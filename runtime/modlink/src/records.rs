//! Module records: the linked, shared state of declarative modules.
//!
//! Records live in an arena owned by the loader and are addressed by
//! [`RecordId`]. Importers hold ids rather than copies, so a circular
//! import observes the same evolving exports object.

use modlink_value::Namespace;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::registry::{ExecuteFn, Setter};

/// Index of a record in the [`RecordTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct RecordId(u32);

impl RecordId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Linked state of one declarative module.
pub(crate) struct ModuleRecord {
    /// One slot per declared dependency, in order. `None` marks a
    /// dependency without live bindings (dynamic or externally resolved).
    pub(crate) dependencies: SmallVec<[Option<RecordId>; 4]>,
    /// Live exports shared with every importer.
    pub(crate) exports: Namespace,
    /// Records to notify when an export changes.
    pub(crate) importers: SmallVec<[RecordId; 4]>,
    pub(crate) setters: Vec<Option<Setter>>,
    /// Taken when the body runs.
    pub(crate) execute: Option<ExecuteFn>,
    /// Set while this module's exporter is notifying importers.
    pub(crate) locked: bool,
}

impl ModuleRecord {
    fn new() -> Self {
        ModuleRecord {
            dependencies: SmallVec::new(),
            exports: Namespace::new(),
            importers: SmallVec::new(),
            setters: Vec::new(),
            execute: None,
            locked: false,
        }
    }

    /// Setter at the position where `dependency` was wired in, if any.
    pub(crate) fn setter_for(&self, dependency: RecordId) -> Option<Setter> {
        let position = self
            .dependencies
            .iter()
            .position(|slot| *slot == Some(dependency))?;
        self.setters.get(position).cloned().flatten()
    }
}

/// Arena of module records, keyed by module name.
#[derive(Default)]
pub(crate) struct RecordTable {
    records: Vec<ModuleRecord>,
    by_name: FxHashMap<String, RecordId>,
}

impl RecordTable {
    /// Get the record for `name`, creating an empty one if absent.
    pub(crate) fn get_or_create(&mut self, name: &str) -> RecordId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "more than u32::MAX modules cannot be registered in practice"
        )]
        let id = RecordId(self.records.len() as u32);
        self.records.push(ModuleRecord::new());
        self.by_name.insert(name.to_owned(), id);
        id
    }

    #[inline]
    pub(crate) fn lookup(&self, name: &str) -> Option<RecordId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub(crate) fn get(&self, id: RecordId) -> &ModuleRecord {
        &self.records[id.index()]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: RecordId) -> &mut ModuleRecord {
        &mut self.records[id.index()]
    }
}
