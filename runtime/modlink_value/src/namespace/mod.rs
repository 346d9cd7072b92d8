//! Shared export namespaces.
//!
//! A namespace is the exports object of a module. Declarative modules hand
//! the same namespace to every importer; dynamic modules are viewed through
//! a default-value envelope (`{ default: exports }`).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::Value;

/// Binding name used by default-value envelopes.
pub const DEFAULT_EXPORT: &str = "default";

bitflags! {
    /// Shape markers carried by a namespace.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct NamespaceFlags: u8 {
        /// This namespace wraps another module's exports under `default`.
        ///
        /// Consumers that want the wrapped value read `default` instead
        /// of the namespace itself.
        const USE_DEFAULT = 1 << 0;
        /// Exports of a dynamic module that already have the declarative
        /// shape; they are exposed as-is rather than wrapped.
        const ES_MODULE = 1 << 1;
    }
}

#[derive(Default)]
struct NamespaceData {
    bindings: BTreeMap<String, Value>,
    flags: NamespaceFlags,
}

/// A shared, mutable mapping from export name to value.
///
/// # Identity
///
/// Equality is identity: two `Namespace`s are equal when they are handles
/// to the same bindings. Use [`Namespace::snapshot`] to compare contents.
///
/// # Invariant
///
/// Bindings are never removed, only overwritten.
#[derive(Clone, Default)]
#[repr(transparent)]
pub struct Namespace(Rc<RefCell<NamespaceData>>);

impl Namespace {
    /// Create an empty namespace.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a namespace holding the given bindings.
    pub fn from_bindings<K: Into<String>>(bindings: impl IntoIterator<Item = (K, Value)>) -> Self {
        let ns = Self::new();
        for (name, value) in bindings {
            ns.set(name, value);
        }
        ns
    }

    /// Wrap `value` in a default-value envelope.
    ///
    /// The envelope has a single `default` binding and the `USE_DEFAULT`
    /// flag set.
    pub fn default_envelope(value: Value) -> Self {
        let ns = Self::new();
        {
            let mut data = ns.0.borrow_mut();
            data.bindings.insert(DEFAULT_EXPORT.to_owned(), value);
            data.flags.insert(NamespaceFlags::USE_DEFAULT);
        }
        ns
    }

    /// Read a binding.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.borrow().bindings.get(name).cloned()
    }

    /// Assign a binding, overwriting any previous value.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().bindings.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().bindings.is_empty()
    }

    /// Binding names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.0.borrow().bindings.keys().cloned().collect()
    }

    /// Copy of the current bindings.
    ///
    /// Values inside the copy still share namespaces with the original.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.0.borrow().bindings.clone()
    }

    pub fn flags(&self) -> NamespaceFlags {
        self.0.borrow().flags
    }

    /// Whether this is a default-value envelope.
    #[inline]
    pub fn uses_default(&self) -> bool {
        self.flags().contains(NamespaceFlags::USE_DEFAULT)
    }

    /// Whether a dynamic module marked these exports as declarative-shaped.
    #[inline]
    pub fn is_es_module(&self) -> bool {
        self.flags().contains(NamespaceFlags::ES_MODULE)
    }

    /// Mark these exports as declarative-shaped.
    pub fn mark_es_module(&self) {
        self.0.borrow_mut().flags.insert(NamespaceFlags::ES_MODULE);
    }

    /// Whether both handles refer to the same bindings.
    #[inline]
    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Keys only: a namespace may (indirectly) contain itself.
impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Namespace")
            .field("names", &data.bindings.keys().collect::<Vec<_>>())
            .field("flags", &data.flags)
            .finish()
    }
}

#[cfg(test)]
mod tests;
