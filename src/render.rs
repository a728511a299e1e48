//! Tree rendering of precomputed closures via `termtree`

use std::collections::HashSet;

use termtree::Tree;
use tracing::instrument;

use crate::domain::{Closure, Key};

pub trait TreeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

/// Render a closure with its origin at the root.
///
/// Each reached id appears once, under the node that first lists it.
/// Ids that were never entered (dangling references) render as leaves.
/// Built with an explicit stack of `(id, next neighbor, subtree)` frames, so
/// chain depth is bounded by memory, not by the call stack.
impl TreeConvert for Closure {
    #[instrument(level = "debug", skip(self), fields(origin = %self.origin()))]
    fn to_tree_string(&self) -> Tree<String> {
        let mut shown: HashSet<&Key> = HashSet::new();
        shown.insert(self.origin());

        let mut stack: Vec<(&Key, usize, Tree<String>)> =
            vec![(self.origin(), 0, Tree::new(self.origin().to_string()))];
        let mut finished = None;

        while let Some((id, next, _)) = stack.last_mut() {
            let neighbors = self
                .reached()
                .get(*id)
                .map(Vec::as_slice)
                .unwrap_or_default();

            if let Some(neighbor) = neighbors.get(*next) {
                *next += 1;
                if shown.insert(neighbor) {
                    stack.push((neighbor, 0, Tree::new(neighbor.to_string())));
                }
                continue;
            }

            // all neighbors handled: attach the subtree to its parent frame
            if let Some((_, _, done)) = stack.pop() {
                match stack.last_mut() {
                    Some((_, _, parent)) => {
                        parent.push(done);
                    }
                    None => finished = Some(done),
                }
            }
        }

        finished.unwrap_or_else(|| Tree::new(self.origin().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BranchName, EntryTable, Traversal};
    use serde_json::json;

    fn render(entries: Vec<(Key, serde_json::Value)>, origin: impl Into<Key>) -> String {
        let branches = vec![BranchName::from_value(&json!("rel"), None).unwrap()];
        let table = EntryTable::normalize(entries, &branches);
        Traversal::new(&table, 0)
            .run(&origin.into())
            .to_tree_string()
            .to_string()
    }

    #[test]
    fn given_leaf_origin_when_rendering_then_single_line() {
        let out = render(vec![(Key::from(4), json!({}))], 4);
        assert_eq!(out.trim_end(), "4");
    }

    #[test]
    fn given_cycle_when_rendering_then_each_id_once() {
        let out = render(
            vec![
                (Key::from("loop1"), json!({"rel": ["loop2", "loop3"]})),
                (Key::from("loop2"), json!({"rel": ["loop3", "loop1"]})),
                (Key::from("loop3"), json!({"rel": ["loop2"]})),
            ],
            "loop1",
        );
        assert_eq!(out.lines().count(), 3);
        assert!(out.lines().next().unwrap().contains("loop1"));
        assert_eq!(out.matches("loop2").count(), 1);
        assert_eq!(out.matches("loop3").count(), 1);
    }

    #[test]
    fn given_dangling_reference_when_rendering_then_shown_as_leaf() {
        let out = render(
            vec![
                (Key::from(6), json!({"rel": 8})),
                (Key::from(8), json!({"rel": 1})),
            ],
            6,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with('8'));
        assert!(lines[2].ends_with('1'));
    }

    #[test]
    fn given_sibling_order_when_rendering_then_first_listed_subtree_first() {
        let out = render(
            vec![
                (Key::from(1), json!({"rel": [2, 3]})),
                (Key::from(2), json!({"rel": [4, 3]})),
                (Key::from(3), json!({})),
                (Key::from(4), json!({})),
            ],
            1,
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["1", "└── 2", "    ├── 4", "    └── 3"]);
    }

    #[test]
    fn given_deep_chain_when_rendering_then_builds_without_recursion() {
        let entries = (0..10_000i64)
            .map(|i| (Key::from(i), json!({"rel": i + 1})))
            .collect();
        let branches = vec![BranchName::from_value(&json!("rel"), None).unwrap()];
        let table = EntryTable::normalize(entries, &branches);
        let tree = Traversal::new(&table, 0).run(&Key::from(0)).to_tree_string();

        // unwind one level at a time so dropping the tree stays shallow too
        let mut depth = 1;
        let mut node = tree;
        assert_eq!(node.root, "0");
        while let Some(child) = node.leaves.pop() {
            assert!(node.leaves.is_empty());
            node = child;
            depth += 1;
        }
        assert_eq!(node.root, "10000");
        assert_eq!(depth, 10_001);
    }
}
