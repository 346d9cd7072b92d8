//! Property-based tests for loading.
//!
//! These tests use proptest to generate random dependency graphs of mixed
//! module styles and verify:
//! 1. Acyclic graphs load, every body runs at most once, and dependencies
//!    run before their dependents
//! 2. A cycle through both styles is always rejected
//! 3. A cycle of a single style always loads

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use std::cell::RefCell;
use std::rc::Rc;

use modlink::{Declaration, Definition, LoadError, Loader};
use proptest::prelude::*;

/// A generated module graph. Module `i` is named `m{i}`; module 0 is the root.
#[derive(Clone, Debug)]
struct Graph {
    dynamic: Vec<bool>,
    deps: Vec<Vec<usize>>,
}

fn name(index: usize) -> String {
    format!("m{index}")
}

/// Random DAG: edges only point from lower to higher indices.
fn dag_strategy(max_modules: usize) -> impl Strategy<Value = Graph> {
    (1..=max_modules)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(any::<bool>(), n),
                prop::collection::vec(prop::collection::vec(any::<bool>(), n), n),
            )
        })
        .prop_map(|(dynamic, edges)| {
            let n = dynamic.len();
            let deps = (0..n)
                .map(|i| (i + 1..n).filter(|&j| edges[i][j]).collect())
                .collect();
            Graph { dynamic, deps }
        })
}

/// Random ring: module `i` depends on module `i + 1`, the last on the root.
fn ring_strategy(max_modules: usize) -> impl Strategy<Value = Graph> {
    (2..=max_modules)
        .prop_flat_map(|n| prop::collection::vec(any::<bool>(), n))
        .prop_map(|dynamic| {
            let n = dynamic.len();
            let deps = (0..n).map(|i| vec![(i + 1) % n]).collect();
            Graph { dynamic, deps }
        })
}

/// Register every module of `graph`. Each body appends its index to the
/// returned log once its dependencies are available; dynamic bodies pull
/// every dependency through `require` first.
fn register(loader: &Loader, graph: &Graph) -> Rc<RefCell<Vec<usize>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for (index, deps) in graph.deps.iter().enumerate() {
        let dep_names: Vec<String> = deps.iter().map(|&dep| name(dep)).collect();
        let dep_refs: Vec<&str> = dep_names.iter().map(String::as_str).collect();
        let log = Rc::clone(&log);

        let definition = if graph.dynamic[index] {
            let required = dep_names.clone();
            Definition::dynamic(move |require, _, _| {
                for dep in &required {
                    require.require(dep)?;
                }
                log.borrow_mut().push(index);
                Ok(None)
            })
        } else {
            Definition::declarative(move |_| {
                Declaration::new().no_setters().execute(move || {
                    log.borrow_mut().push(index);
                    Ok(())
                })
            })
        };
        loader.register(&name(index), &dep_refs, definition).unwrap();
    }
    log
}

/// Indices reachable from the root, the root included.
fn reachable(graph: &Graph) -> Vec<usize> {
    let mut seen = vec![false; graph.deps.len()];
    let mut stack = vec![0];
    while let Some(index) = stack.pop() {
        if !std::mem::replace(&mut seen[index], true) {
            stack.extend(&graph.deps[index]);
        }
    }
    (0..seen.len()).filter(|&i| seen[i]).collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    /// Acyclic graphs load with each body run once, dependencies first.
    #[test]
    fn prop_acyclic_graphs_run_in_dependency_order(graph in dag_strategy(8)) {
        let loader = Loader::new();
        let log = register(&loader, &graph);

        prop_assert!(loader.load(&name(0)).is_ok());

        let log = log.borrow();
        let position = |index: usize| log.iter().position(|&run| run == index);
        for index in reachable(&graph) {
            let runs = log.iter().filter(|&&run| run == index).count();
            prop_assert_eq!(runs, 1, "module {} ran {} times", index, runs);
        }
        for (index, deps) in graph.deps.iter().enumerate() {
            let Some(dependent) = position(index) else { continue };
            for &dep in deps {
                let dependency = position(dep);
                prop_assert!(
                    dependency.is_some_and(|dependency| dependency < dependent),
                    "m{} ran before its dependency m{}",
                    index,
                    dep
                );
            }
        }
    }

    /// Loading twice never runs a body again.
    #[test]
    fn prop_second_load_runs_nothing(graph in dag_strategy(6)) {
        let loader = Loader::new();
        let log = register(&loader, &graph);

        let first = loader.load(&name(0)).unwrap();
        let runs = log.borrow().len();
        let second = loader.load(&name(0)).unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(log.borrow().len(), runs);
    }

    /// A cycle is rejected exactly when it mixes both styles.
    #[test]
    fn prop_cycles_rejected_iff_mixed(graph in ring_strategy(7)) {
        let loader = Loader::new();
        let log = register(&loader, &graph);
        let mixed = graph.dynamic.iter().any(|&d| d) && graph.dynamic.iter().any(|&d| !d);

        let result = loader.load(&name(0));
        if mixed {
            prop_assert!(matches!(result, Err(LoadError::MixedCycle { .. })), "{:?}", result);
            prop_assert!(log.borrow().is_empty());
        } else {
            prop_assert!(result.is_ok(), "{:?}", result);
            prop_assert_eq!(log.borrow().len(), graph.deps.len());
        }
    }
}
