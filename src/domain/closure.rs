//! Cycle-safe transitive traversal along one branch

use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use tracing::{instrument, trace};

use crate::domain::entries::EntryTable;
use crate::domain::key::Key;

/// Everything one origin reaches along one branch.
///
/// `reached` maps every visited entry to its direct neighbors with the origin
/// and the entry itself filtered out. The closure set is the union of those
/// lists, so the origin never appears in its own closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closure {
    origin: Key,
    reached: BTreeMap<Key, Vec<Key>>,
}

impl Closure {
    pub fn origin(&self) -> &Key {
        &self.origin
    }

    /// Visited entries and their filtered direct neighbors.
    pub fn reached(&self) -> &BTreeMap<Key, Vec<Key>> {
        &self.reached
    }

    /// Flatten the per-node lists into the distinct closure ids.
    pub fn ids(&self) -> impl Iterator<Item = &Key> {
        self.reached.values().flatten().unique()
    }

    pub fn is_empty(&self) -> bool {
        self.reached.values().all(Vec::is_empty)
    }
}

/// Depth-first walk of one branch starting from an origin entry.
pub struct Traversal<'a> {
    table: &'a EntryTable,
    branch: usize,
}

impl<'a> Traversal<'a> {
    pub fn new(table: &'a EntryTable, branch: usize) -> Self {
        debug_assert!(
            branch < table.width(),
            "branch position {branch} out of range for {} declared branches",
            table.width()
        );
        Self { table, branch }
    }

    /// Compute the closure of `origin`.
    ///
    /// A neighbor is descended into only if it is an entry and has not been
    /// visited during this walk, so every entry is entered at most once.
    /// Neighbors that are not entries are recorded but never followed.
    #[instrument(level = "trace", skip(self), fields(branch = self.branch))]
    pub fn run(&self, origin: &Key) -> Closure {
        let mut visited: HashSet<&Key> = HashSet::new();
        let mut reached = BTreeMap::new();
        let mut stack: Vec<&Key> = Vec::new();

        if self.table.contains(origin) {
            visited.insert(origin);
            stack.push(origin);
        }

        while let Some(current) = stack.pop() {
            let direct = self.table.direct(current, self.branch).unwrap_or_default();

            let filtered: Vec<Key> = direct
                .iter()
                .filter(|id| *id != origin && *id != current)
                .cloned()
                .collect();
            reached.insert(current.clone(), filtered);

            // reversed so the first listed neighbor is entered first
            for neighbor in direct.iter().rev() {
                if self.table.contains(neighbor) && visited.insert(neighbor) {
                    stack.push(neighbor);
                }
            }
        }

        trace!(%origin, visited = reached.len(), "Closure computed");
        Closure {
            origin: origin.clone(),
            reached,
        }
    }
}
