//! Handles given to dynamic module bodies.

use std::cell::RefCell;
use std::rc::Rc;

use modlink_value::{Namespace, Value};

use crate::errors::LoadResult;
use crate::loader::Loader;

/// Identity and current exports of a dynamic module.
#[derive(Debug)]
pub struct ModuleHandle {
    id: String,
    exports: RefCell<Value>,
}

impl ModuleHandle {
    /// New handle whose exports are `exports`.
    pub(crate) fn new(id: &str, exports: Namespace) -> Self {
        ModuleHandle {
            id: id.to_owned(),
            exports: RefCell::new(Value::Namespace(exports)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current exports value.
    pub fn exports(&self) -> Value {
        self.exports.borrow().clone()
    }

    /// Replace the exports value wholesale.
    pub fn set_exports(&self, value: Value) {
        *self.exports.borrow_mut() = value;
    }
}

/// Dependency lookup for a running dynamic module.
///
/// Only names the module declared as dependencies can be resolved.
pub struct Require {
    loader: Loader,
    module: String,
    dependencies: Rc<[String]>,
}

impl Require {
    pub(crate) fn new(loader: Loader, module: &str, dependencies: Rc<[String]>) -> Self {
        Require {
            loader,
            module: module.to_owned(),
            dependencies,
        }
    }

    /// Resolve a declared dependency by the name the module used for it.
    ///
    /// Returns `Ok(None)` when `alias` is not one of the declared
    /// dependencies; callers must check. Resolving may link, evaluate or
    /// load the dependency.
    pub fn require(&self, alias: &str) -> LoadResult<Option<Value>> {
        let Some(position) = self.dependencies.iter().position(|dep| dep == alias) else {
            tracing::debug!(module = %self.module, alias, "require of undeclared dependency");
            return Ok(None);
        };
        self.loader
            .get_module(&self.dependencies[position])
            .map(Some)
    }

    /// Name of the module this handle belongs to.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Declared dependency names, in order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}
