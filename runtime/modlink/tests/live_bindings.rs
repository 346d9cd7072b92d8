//! Live-binding propagation between declarative modules.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use modlink::{Declaration, Definition, Exporter, Loader, Value};
use pretty_assertions::assert_eq;

/// Declarative counter module. The exporter escapes through `handle` so
/// the test can assign exports after loading.
fn counter(handle: &Rc<RefCell<Option<Exporter>>>) -> Definition {
    let handle = Rc::clone(handle);
    Definition::declarative(move |export| {
        *handle.borrow_mut() = Some(export.clone());
        Declaration::new().no_setters().execute(move || {
            export.export("count", Value::int(0));
            Ok(())
        })
    })
}

#[test]
fn importers_see_later_exports() {
    let loader = Loader::new();
    let exporter = Rc::new(RefCell::new(None));
    loader.register("counter", &[], counter(&exporter)).unwrap();

    let notified = Rc::new(Cell::new(0));
    let view = Rc::new(RefCell::new(Value::Undefined));
    {
        let notified = Rc::clone(&notified);
        let view = Rc::clone(&view);
        loader
            .register(
                "app",
                &["counter"],
                Definition::declarative(move |_| {
                    Declaration::new()
                        .setter(move |counter| {
                            notified.set(notified.get() + 1);
                            *view.borrow_mut() = counter.clone();
                        })
                        .execute(|| Ok(()))
                }),
            )
            .unwrap();
    }

    loader.load("app").unwrap();
    // Once at link time, once for the body's export.
    assert_eq!(notified.get(), 2);
    assert_eq!(view.borrow().member("count"), Some(Value::int(0)));

    let exporter = exporter.borrow().clone().unwrap();
    let returned = exporter.export("count", Value::int(5));
    assert_eq!(returned, Value::int(5));
    assert_eq!(notified.get(), 3);
    assert_eq!(view.borrow().member("count"), Some(Value::int(5)));

    exporter.export_all([("count", Value::int(6)), ("extra", Value::Null)]);
    assert_eq!(notified.get(), 4);
    assert_eq!(exporter.exports().len(), 2);

    // The importer holds the same namespace the loader exposes.
    let exposed = loader.load("counter").unwrap();
    assert!(exposed
        .as_namespace()
        .unwrap()
        .ptr_eq(view.borrow().as_namespace().unwrap()));
}

#[test]
fn re_exports_propagate_through_chains() {
    let loader = Loader::new();
    let source = Rc::new(RefCell::new(None));
    loader.register("source", &[], counter(&source)).unwrap();
    loader
        .register(
            "relay",
            &["source"],
            Definition::declarative(|export| {
                Declaration::new()
                    .setter(move |source| {
                        if let Some(count) = source.member("count") {
                            export.export("count", count);
                        }
                    })
                    .execute(|| Ok(()))
            }),
        )
        .unwrap();

    let relay = loader.load("relay").unwrap();
    assert_eq!(relay.member("count"), Some(Value::int(0)));

    let source = source.borrow().clone().unwrap();
    source.export("count", Value::int(9));
    assert_eq!(relay.member("count"), Some(Value::int(9)));
}

#[test]
fn locked_importer_is_not_reentered() {
    let loader = Loader::new();
    let ping_calls = Rc::new(Cell::new(0));
    let pong_calls = Rc::new(Cell::new(0));

    // ping exports `ball`; pong echoes it back as `echo`, which ping would
    // mirror as `returned`. ping is still notifying when pong echoes, so
    // the echo never reaches ping's setter.
    {
        let ping_calls = Rc::clone(&ping_calls);
        loader
            .register(
                "ping",
                &["pong"],
                Definition::declarative(move |export| {
                    let setter_export = export.clone();
                    Declaration::new()
                        .setter(move |pong| {
                            ping_calls.set(ping_calls.get() + 1);
                            if let Some(echo) = pong.member("echo") {
                                setter_export.export("returned", echo);
                            }
                        })
                        .execute(move || {
                            export.export("ball", Value::int(1));
                            Ok(())
                        })
                }),
            )
            .unwrap();
    }
    {
        let pong_calls = Rc::clone(&pong_calls);
        loader
            .register(
                "pong",
                &["ping"],
                Definition::declarative(move |export| {
                    Declaration::new()
                        .setter(move |ping| {
                            pong_calls.set(pong_calls.get() + 1);
                            if let Some(ball) = ping.member("ball") {
                                export.export("echo", ball);
                            }
                        })
                        .execute(|| Ok(()))
                }),
            )
            .unwrap();
    }

    let ping = loader.load("ping").unwrap();
    let pong = loader.load("pong").unwrap();

    assert_eq!(pong.member("echo"), Some(Value::int(1)));
    assert_eq!(ping.member("returned"), None);
    // Link-time call only; the echo arrived while ping was locked.
    assert_eq!(ping_calls.get(), 1);
    // Link-time call plus ping's export.
    assert_eq!(pong_calls.get(), 2);
}

#[test]
fn skipped_setter_positions_are_not_notified() {
    let loader = Loader::new();
    let first = Rc::new(RefCell::new(None));
    let second = Rc::new(RefCell::new(None));
    loader.register("first", &[], counter(&first)).unwrap();
    loader.register("second", &[], counter(&second)).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    loader
        .register(
            "app",
            &["first", "second", "first"],
            Definition::declarative(move |_| {
                Declaration::new()
                    .skip_setter()
                    .setter(move |second| {
                        sink.borrow_mut().push(second.member("count"));
                    })
                    .execute(|| Ok(()))
            }),
        )
        .unwrap();

    loader.load("app").unwrap();
    first
        .borrow()
        .clone()
        .unwrap()
        .export("count", Value::int(1));
    second
        .borrow()
        .clone()
        .unwrap()
        .export("count", Value::int(2));

    assert_eq!(
        *seen.borrow(),
        vec![None, Some(Value::int(0)), Some(Value::int(2))]
    );
}

#[test]
fn exporter_outliving_loader_is_harmless() {
    let exporter = Rc::new(RefCell::new(None));
    let namespace = {
        let loader = Loader::new();
        loader.register("m", &[], counter(&exporter)).unwrap();
        loader.load("m").unwrap()
    };

    let exporter = exporter.borrow().clone().unwrap();
    exporter.export("count", Value::int(3));
    assert_eq!(namespace.member("count"), Some(Value::int(3)));
}
