//! Runtime values.
//!
//! # Construction
//!
//! Heap-backed variants are built through factory methods:
//!
//! ```text
//! let s = Value::string("hello");
//! let xs = Value::list(vec![Value::int(1), Value::int(2)]);
//! let f = Value::native("inc", |args| ...);
//! ```
//!
//! # Equality
//!
//! Scalars, strings and lists compare structurally. Namespaces and native
//! functions compare by identity, mirroring how modules share them.

use std::fmt;
use std::rc::Rc;

use crate::{Namespace, DEFAULT_EXPORT};

/// Signature of a host function carried in a [`Value`].
type NativeFnImpl = dyn Fn(&[Value]) -> Value;

/// A named host function.
#[derive(Clone)]
pub struct NativeFn {
    name: Rc<str>,
    func: Rc<NativeFnImpl>,
}

impl NativeFn {
    pub fn new(name: &str, func: impl Fn(&[Value]) -> Value + 'static) -> Self {
        NativeFn {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the function.
    #[inline]
    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

/// A value exported by, or passed between, modules.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Immutable string.
    Str(Rc<str>),
    /// Immutable list of values.
    List(Rc<Vec<Value>>),
    /// Shared exports object (live bindings).
    Namespace(Namespace),
    /// Host function.
    Native(NativeFn),
}

impl Value {
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// Create a string value.
    #[inline]
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    /// Create a list value.
    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    /// Create a host function value.
    pub fn native(name: &str, func: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Value::Native(NativeFn::new(name, func))
    }

    /// Create a namespace value holding the given bindings.
    pub fn namespace<K: Into<String>>(bindings: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Namespace(Namespace::from_bindings(bindings))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Value::Namespace(ns) => Some(ns),
            _ => None,
        }
    }

    pub fn as_native(&self) -> Option<&NativeFn> {
        match self {
            Value::Native(f) => Some(f),
            _ => None,
        }
    }

    /// Read a binding when this value is a namespace.
    pub fn member(&self, name: &str) -> Option<Value> {
        self.as_namespace().and_then(|ns| ns.get(name))
    }

    /// Look through a default-value envelope.
    ///
    /// Returns the wrapped `default` binding when this is an envelope, and
    /// the value itself otherwise.
    pub fn unwrap_default(self) -> Value {
        if let Value::Namespace(ns) = &self {
            if ns.uses_default() {
                return ns.get(DEFAULT_EXPORT).unwrap_or_default();
            }
        }
        self
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        const MAX_DEPTH: usize = 4;

        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                if depth >= MAX_DEPTH {
                    return write!(f, "[...]");
                }
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_nested(f, depth + 1)?;
                }
                write!(f, "]")
            }
            Value::Namespace(ns) => {
                if ns.is_empty() {
                    return write!(f, "{{}}");
                }
                if depth >= MAX_DEPTH {
                    return write!(f, "{{...}}");
                }
                write!(f, "{{ ")?;
                for (i, (name, value)) in ns.snapshot().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: ")?;
                    value.fmt_nested(f, depth + 1)?;
                }
                write!(f, " }}")
            }
            Value::Native(func) => write!(f, "[function {}]", func.name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Namespace(a), Value::Namespace(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, 0)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Namespace> for Value {
    fn from(ns: Namespace) -> Self {
        Value::Namespace(ns)
    }
}
