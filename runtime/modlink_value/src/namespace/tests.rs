use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_set_overwrites_and_never_removes() {
    let ns = Namespace::new();
    assert!(ns.is_empty());

    ns.set("x", Value::int(1));
    ns.set("y", Value::int(2));
    ns.set("x", Value::int(3));

    assert_eq!(ns.len(), 2);
    assert_eq!(ns.get("x"), Some(Value::int(3)));
    assert!(ns.contains("y"));
    assert_eq!(ns.names(), vec!["x".to_owned(), "y".to_owned()]);
}

#[test]
fn test_clones_share_bindings() {
    let exports = Namespace::new();
    let importer_view = exports.clone();

    exports.set("late", Value::Bool(true));

    assert_eq!(importer_view.get("late"), Some(Value::Bool(true)));
    assert!(importer_view.ptr_eq(&exports));
    assert_eq!(importer_view, exports);
}

#[test]
fn test_snapshot_is_detached_copy() {
    let ns = Namespace::from_bindings([("a", Value::int(1))]);
    let before = ns.snapshot();
    ns.set("b", Value::int(2));

    assert_eq!(before.len(), 1);
    assert_eq!(ns.snapshot().len(), 2);
}

#[test]
fn test_default_envelope_shape() {
    let envelope = Namespace::default_envelope(Value::int(9));
    assert!(envelope.uses_default());
    assert!(!envelope.is_es_module());
    assert_eq!(envelope.names(), vec![DEFAULT_EXPORT.to_owned()]);
    assert_eq!(envelope.get(DEFAULT_EXPORT), Some(Value::int(9)));
}

#[test]
fn test_es_module_flag() {
    let ns = Namespace::new();
    assert_eq!(ns.flags(), NamespaceFlags::empty());
    ns.mark_es_module();
    assert!(ns.is_es_module());
    assert!(!ns.uses_default());
}

#[test]
fn test_debug_lists_names_only() {
    let ns = Namespace::new();
    ns.set("self_ref", Value::Namespace(ns.clone()));
    let rendered = format!("{ns:?}");
    assert!(rendered.contains("self_ref"));
}
