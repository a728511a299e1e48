//! Normalized entry table: id -> direct relations per declared branch

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::domain::key::{BranchName, Key, Relation};

/// Direct relations of every entry, indexed by declared-branch position.
///
/// Every entry holds exactly one list per declared branch. Lists may be empty
/// and may reference ids that are not entries.
#[derive(Debug, Clone, Default)]
pub struct EntryTable {
    entries: BTreeMap<Key, Vec<Vec<Key>>>,
    width: usize,
}

impl EntryTable {
    /// Normalize raw attribute bags against the declared branches.
    ///
    /// Absent or `null` relations become empty lists, scalar relations become
    /// singleton lists. Fields that are not declared branches are ignored.
    #[instrument(level = "debug", skip_all, fields(branches = branches.len()))]
    pub fn normalize(entries: Vec<(Key, Value)>, branches: &[BranchName]) -> Self {
        let mut table = BTreeMap::new();

        for (id, bag) in entries {
            let attributes = bag.as_object();
            if attributes.is_none() && !bag.is_null() {
                trace!(%id, "Attribute bag is not an object, treating as empty");
            }

            let relations = branches
                .iter()
                .map(|branch| {
                    attributes
                        .and_then(|attrs| attrs.get(branch.as_str()))
                        .map(|value| Relation::from_value(value).into_keys())
                        .unwrap_or_default()
                })
                .collect();

            table.insert(id, relations);
        }

        debug!(entries = table.len(), "Normalized entry table");
        Self {
            entries: table,
            width: branches.len(),
        }
    }

    /// Direct relations of `id` on the branch at `branch` position.
    pub fn direct(&self, id: &Key, branch: usize) -> Option<&[Key]> {
        self.entries
            .get(id)
            .and_then(|relations| relations.get(branch))
            .map(Vec::as_slice)
    }

    pub fn contains(&self, id: &Key) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of declared branches each entry carries a list for.
    pub fn width(&self) -> usize {
        self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn branches(names: &[&str]) -> Vec<BranchName> {
        names
            .iter()
            .map(|n| BranchName::from_value(&json!(n), None).unwrap())
            .collect()
    }

    #[test]
    fn given_missing_branch_when_normalizing_then_empty_list() {
        let table = EntryTable::normalize(
            vec![(Key::from(4), json!({}))],
            &branches(&["ancestor", "descendants"]),
        );
        assert_eq!(table.direct(&Key::from(4), 0), Some(&[][..]));
        assert_eq!(table.direct(&Key::from(4), 1), Some(&[][..]));
        assert_eq!(table.width(), 2);
    }

    #[test]
    fn given_scalar_branch_when_normalizing_then_singleton() {
        let table = EntryTable::normalize(
            vec![(Key::from(6), json!({"ancestor": 8, "colour": "red"}))],
            &branches(&["ancestor"]),
        );
        assert_eq!(table.direct(&Key::from(6), 0), Some(&[Key::from(8)][..]));
    }

    #[test]
    fn given_non_object_bag_when_normalizing_then_all_branches_empty() {
        let table = EntryTable::normalize(
            vec![(Key::from("odd"), json!("not a bag"))],
            &branches(&["ancestor"]),
        );
        assert!(table.contains(&Key::from("odd")));
        assert_eq!(table.direct(&Key::from("odd"), 0), Some(&[][..]));
    }

    #[test]
    fn given_duplicate_ids_when_normalizing_then_last_wins() {
        let table = EntryTable::normalize(
            vec![
                (Key::from(1), json!({"ancestor": 2})),
                (Key::from(1), json!({"ancestor": 3})),
            ],
            &branches(&["ancestor"]),
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.direct(&Key::from(1), 0), Some(&[Key::from(3)][..]));
    }

    #[test]
    fn given_unknown_id_when_looking_up_then_none() {
        let table = EntryTable::normalize(vec![], &branches(&["ancestor"]));
        assert!(table.is_empty());
        assert_eq!(table.direct(&Key::from(1), 0), None);
    }
}
