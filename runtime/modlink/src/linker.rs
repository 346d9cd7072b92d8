//! Linking.
//!
//! Groups from [`grouping`](crate::grouping) are linked farthest first, so
//! dependencies are wired before their dependents. Each group uses the
//! strategy of its style:
//!
//! - **Declarative**: create the shared record, run the setup with an
//!   exporter, then wire every dependency in order and hand its exports to
//!   the setter at the same position. Bodies do not run yet.
//! - **Dynamic**: allocate exports and a handle, link dynamic dependencies
//!   first (unless the module resolves them itself), then run the body.
//!
//! Both procedures are idempotent: the entry's record/handle slot is set
//! before any recursion, so a cycle finds the module already started.

use std::rc::Rc;

use modlink_value::{Namespace, Value};

use crate::errors::{LoadError, LoadResult};
use crate::exporter::Exporter;
use crate::grouping;
use crate::loader::Loader;
use crate::records::RecordId;
use crate::registry::{EntryKind, ModuleStyle};
use crate::require::{ModuleHandle, Require};
use crate::stack::ensure_sufficient_stack;

impl Loader {
    /// Link `root` and every registered module it depends on.
    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn link(&self, root: &str) -> LoadResult<()> {
        let groups = grouping::group(&self.state.registry.borrow(), root)?;

        for group in groups.farthest_first() {
            tracing::trace!(
                index = group.index,
                style = %group.style,
                members = group.members.len(),
                "linking group"
            );
            for name in &group.members {
                match group.style {
                    ModuleStyle::Declarative => self.link_declarative(name)?,
                    ModuleStyle::Dynamic => self.link_dynamic(name)?,
                }
            }
        }
        Ok(())
    }

    /// Link a declarative module. No-op if already started or not declarative.
    pub(crate) fn link_declarative(&self, name: &str) -> LoadResult<()> {
        ensure_sufficient_stack(|| self.link_declarative_inner(name))
    }

    fn link_declarative_inner(&self, name: &str) -> LoadResult<()> {
        let (record, setup, deps) = {
            let mut registry = self.state.registry.borrow_mut();
            let Some(entry) = registry.get_mut(name) else {
                return Ok(());
            };
            let deps = Rc::clone(&entry.deps);
            let EntryKind::Declarative { setup, record } = &mut entry.kind else {
                return Ok(());
            };
            if record.is_some() {
                return Ok(());
            }
            let id = self.state.records.borrow_mut().get_or_create(name);
            *record = Some(id);
            (id, setup.take(), deps)
        };
        tracing::trace!(module = name, "linking declarative module");

        let Some(setup) = setup else {
            return Err(LoadError::invalid_declaration(name));
        };
        let exports = self.state.records.borrow().get(record).exports.clone();
        let exporter = Exporter::new(self.downgrade(), record, exports);

        let (setters, execute) = setup
            .invoke(exporter)
            .into_parts()
            .ok_or_else(|| LoadError::invalid_declaration(name))?;
        {
            let mut records = self.state.records.borrow_mut();
            let module = records.get_mut(record);
            module.setters = setters;
            module.execute = Some(execute);
        }

        for (position, dep) in deps.iter().enumerate() {
            let (dep_exports, dep_record) = self.resolve_for_declarative(dep)?;

            let setter = {
                let mut records = self.state.records.borrow_mut();
                if let Some(dep_record) = dep_record {
                    records.get_mut(dep_record).importers.push(record);
                }
                let module = records.get_mut(record);
                module.dependencies.push(dep_record);
                module.setters.get(position).cloned().flatten()
            };
            if let Some(setter) = setter {
                setter(&dep_exports);
            }
        }
        Ok(())
    }

    /// Exports a declarative importer sees for `dep`, plus the record to
    /// wire for live bindings (`None` for dynamic or external modules).
    fn resolve_for_declarative(&self, dep: &str) -> LoadResult<(Value, Option<RecordId>)> {
        if let Some(existing) = self.record_exports(dep) {
            return Ok(existing);
        }
        match self.style_of(dep) {
            None => Ok((self.load(dep)?, None)),
            Some(ModuleStyle::Dynamic) => {
                self.link_dynamic(dep)?;
                let exports = self.dynamic_exports(dep).unwrap_or_default();
                Ok((self.wrap_dynamic_exports(exports), None))
            }
            Some(ModuleStyle::Declarative) => {
                self.link_declarative(dep)?;
                self.record_exports(dep)
                    .ok_or_else(|| LoadError::invalid_declaration(dep))
            }
        }
    }

    fn record_exports(&self, name: &str) -> Option<(Value, Option<RecordId>)> {
        let records = self.state.records.borrow();
        let id = records.lookup(name)?;
        Some((Value::Namespace(records.get(id).exports.clone()), Some(id)))
    }

    /// Current exports of a linked dynamic module.
    pub(crate) fn dynamic_exports(&self, name: &str) -> Option<Value> {
        let registry = self.state.registry.borrow();
        registry.get(name)?.module_handle().map(|module| module.exports())
    }

    /// Link and run a dynamic module. No-op if already started or not dynamic.
    pub(crate) fn link_dynamic(&self, name: &str) -> LoadResult<()> {
        ensure_sufficient_stack(|| self.link_dynamic_inner(name))
    }

    fn link_dynamic_inner(&self, name: &str) -> LoadResult<()> {
        let (handle, exports, body, executing_require, deps) = {
            let mut registry = self.state.registry.borrow_mut();
            let Some(entry) = registry.get_mut(name) else {
                return Ok(());
            };
            let deps = Rc::clone(&entry.deps);
            let EntryKind::Dynamic {
                body,
                executing_require,
                module,
            } = &mut entry.kind
            else {
                return Ok(());
            };
            if module.is_some() {
                return Ok(());
            }
            let exports = Namespace::new();
            let handle = Rc::new(ModuleHandle::new(name, exports.clone()));
            *module = Some(Rc::clone(&handle));
            (handle, exports, body.take(), *executing_require, deps)
        };
        tracing::trace!(module = name, executing_require, "linking dynamic module");

        if !executing_require {
            for dep in deps.iter() {
                if self.style_of(dep) == Some(ModuleStyle::Dynamic) {
                    self.link_dynamic(dep)?;
                }
            }
        }

        if let Some(entry) = self.state.registry.borrow_mut().get_mut(name) {
            entry.evaluated = true;
        }
        let Some(body) = body else {
            return Ok(());
        };

        let require = Require::new(self.clone(), name, deps);
        if let Some(replacement) = body(&require, &exports, &handle)? {
            handle.set_exports(replacement);
        }
        Ok(())
    }
}
