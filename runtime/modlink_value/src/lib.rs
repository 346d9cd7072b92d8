//! Modlink Value - runtime values exchanged between linked modules.
//!
//! This crate provides:
//! - `Value`: the dynamically typed value a module exports or receives
//! - `Namespace`: the shared, mutable exports object of a module
//! - `NativeFn`: host functions carried as values
//!
//! # Sharing Model
//!
//! Everything here is single-threaded. A `Namespace` is a handle over
//! `Rc<RefCell<..>>`: cloning it (or a `Value::Namespace` holding it) yields
//! another view of the same bindings, which is what lets importers observe
//! live updates made by the exporting module.

mod namespace;
mod value;

pub use namespace::{Namespace, NamespaceFlags, DEFAULT_EXPORT};
pub use value::{NativeFn, Value};
