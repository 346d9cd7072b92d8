//! Dependency grouping.
//!
//! Partitions the registry-resident dependencies of a root module into
//! groups by *style distance*: the number of declarative/dynamic boundary
//! crossings on the way from the root. Modules in one group share a style
//! and are linked together in one pass.
//!
//! # Algorithm
//!
//! ```text
//! visit(m):                       index(root) = 0
//!   add m to groups[index(m)]     (once)
//!   for dep in deps(m), still registered, not linked, not evaluated:
//!     d = index(m) + (style(dep) != style(m))
//!     if d > index(dep):          indices only grow
//!       move dep to groups[d]     old group emptied => mixed cycle
//!     visit(dep)
//! ```
//!
//! A cycle that crosses the style boundary an odd number of times keeps
//! raising the indices of its members. Such a cycle is detected either
//! when a move empties a group or when an index exceeds the number of
//! registered modules, which no acyclic path can reach.

use rustc_hash::FxHashMap;

use crate::errors::{LoadError, LoadResult};
use crate::registry::{ModuleStyle, Registry};
use crate::stack::ensure_sufficient_stack;

/// Modules linked together with one strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Group {
    /// Style distance from the root.
    pub(crate) index: usize,
    pub(crate) style: ModuleStyle,
    pub(crate) members: Vec<String>,
}

/// Result of one grouping run, ordered by distance from the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DependencyGroups {
    groups: Vec<Group>,
}

impl DependencyGroups {
    /// Groups ordered farthest first, the order in which they are linked.
    pub(crate) fn farthest_first(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().rev()
    }

    #[cfg(test)]
    pub(crate) fn groups(&self) -> &[Group] {
        &self.groups
    }
}

struct Grouper<'a> {
    registry: &'a Registry,
    groups: Vec<Vec<&'a str>>,
    index: FxHashMap<&'a str, usize>,
    /// Number of registered modules; no acyclic path reaches this index.
    limit: usize,
}

/// Group the dependency graph reachable from `root`.
///
/// `root` must be declared. Fails with `MixedCycle` when the graph cannot
/// be linearized.
pub(crate) fn group(registry: &Registry, root: &str) -> LoadResult<DependencyGroups> {
    let Some((root, entry)) = registry.get_key_value(root) else {
        return Err(LoadError::not_found(root));
    };
    let root = root.as_str();
    let root_style = entry.style();

    let mut grouper = Grouper {
        registry,
        groups: Vec::new(),
        index: FxHashMap::default(),
        limit: registry.len(),
    };
    grouper.index.insert(root, 0);
    grouper.visit(root)?;

    let groups = grouper
        .groups
        .into_iter()
        .enumerate()
        .map(|(index, members)| Group {
            index,
            style: if index % 2 == 0 {
                root_style
            } else {
                root_style.opposite()
            },
            members: members.into_iter().map(str::to_owned).collect(),
        })
        .collect();
    Ok(DependencyGroups { groups })
}

impl<'a> Grouper<'a> {
    fn visit(&mut self, name: &'a str) -> LoadResult<()> {
        ensure_sufficient_stack(|| self.visit_inner(name))
    }

    fn visit_inner(&mut self, name: &'a str) -> LoadResult<()> {
        let registry = self.registry;
        let Some(entry) = registry.get(name) else {
            return Ok(());
        };
        let Some(&index) = self.index.get(name) else {
            return Ok(());
        };

        if self.groups.len() <= index {
            self.groups.resize_with(index + 1, Vec::new);
        }
        if self.groups[index].contains(&name) {
            return Ok(());
        }
        self.groups[index].push(name);

        for dep in entry.deps.iter() {
            let dep = dep.as_str();
            let Some(dep_entry) = registry.get(dep) else {
                // Resolved by an earlier load; nothing to link.
                continue;
            };
            if dep_entry.evaluated || dep_entry.is_linked() {
                continue;
            }

            // A cycle may have moved this module further out meanwhile.
            let index = self.index.get(name).copied().unwrap_or(index);
            let dep_index = index + usize::from(dep_entry.style() != entry.style());
            if dep_index >= self.limit {
                tracing::debug!(module = dep, dep_index, "style distance exceeds graph size");
                return Err(LoadError::mixed_cycle(dep));
            }

            match self.index.get(dep).copied() {
                Some(current) if current >= dep_index => {}
                Some(current) => {
                    let old_group = &mut self.groups[current];
                    old_group.retain(|member| *member != dep);
                    if old_group.is_empty() {
                        tracing::debug!(module = dep, from = current, to = dep_index, "group emptied");
                        return Err(LoadError::mixed_cycle(dep));
                    }
                    self.index.insert(dep, dep_index);
                }
                None => {
                    self.index.insert(dep, dep_index);
                }
            }

            self.visit(dep)?;
        }
        Ok(())
    }
}
