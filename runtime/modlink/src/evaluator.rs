//! Evaluation ordering for declarative modules.
//!
//! Bodies run depth-first, dependencies left to right, each exactly once.
//! `seen` is the set of modules whose evaluation has started in this
//! traversal; meeting one again means a cycle, and that dependency is left
//! as it is (possibly partially initialized) rather than re-entered.

use std::rc::Rc;

use modlink_value::Value;
use rustc_hash::FxHashSet;

use crate::errors::LoadResult;
use crate::loader::Loader;
use crate::registry::ModuleStyle;
use crate::stack::ensure_sufficient_stack;

impl Loader {
    /// Run the body of declarative module `name` after its dependencies.
    ///
    /// No-op for modules that are not registered, not declarative, or
    /// already evaluated.
    pub(crate) fn ensure_evaluated(&self, name: &str, seen: &mut FxHashSet<String>) -> LoadResult<()> {
        ensure_sufficient_stack(|| self.ensure_evaluated_inner(name, seen))
    }

    fn ensure_evaluated_inner(&self, name: &str, seen: &mut FxHashSet<String>) -> LoadResult<()> {
        let deps = {
            let registry = self.state.registry.borrow();
            let Some(entry) = registry.get(name) else {
                return Ok(());
            };
            if entry.evaluated || entry.style() != ModuleStyle::Declarative {
                return Ok(());
            }
            Rc::clone(&entry.deps)
        };
        seen.insert(name.to_owned());

        for dep in deps.iter() {
            if seen.contains(dep) {
                continue;
            }
            if self.is_declared(dep) {
                self.ensure_evaluated(dep, seen)?;
            } else {
                self.load(dep)?;
            }
        }

        let record = {
            let mut registry = self.state.registry.borrow_mut();
            let Some(entry) = registry.get_mut(name) else {
                return Ok(());
            };
            // A nested call may have finished the job.
            if entry.evaluated {
                return Ok(());
            }
            entry.evaluated = true;
            entry.record()
        };

        let execute = record.and_then(|id| self.state.records.borrow_mut().get_mut(id).execute.take());
        match execute {
            Some(execute) => {
                tracing::trace!(module = name, "executing declarative body");
                execute()
            }
            None => Ok(()),
        }
    }

    /// Resolve a dependency on behalf of a running dynamic module.
    ///
    /// - not registered: load it, looking through a default envelope
    /// - declarative: link if needed, evaluate, return its namespace
    /// - dynamic: link (and run) if needed, return its raw exports
    pub(crate) fn get_module(&self, name: &str) -> LoadResult<Value> {
        match self.style_of(name) {
            None => Ok(self.load(name)?.unwrap_default()),
            Some(ModuleStyle::Declarative) => {
                self.link_declarative(name)?;
                self.ensure_evaluated(name, &mut FxHashSet::default())?;
                let exports = {
                    let records = self.state.records.borrow();
                    records
                        .lookup(name)
                        .map(|id| Value::Namespace(records.get(id).exports.clone()))
                };
                Ok(exports.unwrap_or_default().unwrap_default())
            }
            Some(ModuleStyle::Dynamic) => {
                self.link_dynamic(name)?;
                Ok(self.dynamic_exports(name).unwrap_or_default())
            }
        }
    }
}
