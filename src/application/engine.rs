//! Closure engine: build-once precomputation and read-only queries

use std::collections::{BTreeMap, BTreeSet, HashMap};

use itertools::Itertools;
use rayon::prelude::*;
use serde_json::Value;
use termtree::Tree;
use tracing::{debug, instrument, trace};

use crate::config::BuildSettings;
use crate::domain::{BranchName, Closure, DomainError, DomainResult, EntryTable, Key, Traversal};
use crate::render::TreeConvert;

/// Transitive closures of every entry along every declared branch.
///
/// All traversal happens in [`EngineBuilder::build`]; queries only read the
/// precomputed closure table and hand back owned sets. The engine is never
/// mutated after construction, so shared references can be queried from any
/// number of threads.
#[derive(Debug)]
pub struct ClosureEngine {
    branches: Vec<BranchName>,
    positions: HashMap<BranchName, usize>,
    entries: EntryTable,
    closures: Vec<BTreeMap<Key, Closure>>,
}

/// Collects branches, entries and build settings for a [`ClosureEngine`].
#[derive(Debug, Default)]
pub struct EngineBuilder {
    branches: Vec<Value>,
    entries: Vec<(Key, Value)>,
    settings: BuildSettings,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn branch(mut self, branch: impl Into<Value>) -> Self {
        self.branches.push(branch.into());
        self
    }

    pub fn branches<I, B>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Value>,
    {
        self.branches.extend(branches.into_iter().map(Into::into));
        self
    }

    /// Add one entry. `attributes` is read for declared branch names only.
    pub fn entry(mut self, id: impl Into<Key>, attributes: impl Into<Value>) -> Self {
        self.entries.push((id.into(), attributes.into()));
        self
    }

    pub fn entries<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        self.entries
            .extend(entries.into_iter().map(|(id, bag)| (id.into(), bag.into())));
        self
    }

    pub fn settings(mut self, settings: BuildSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validate branch names, normalize entries and precompute all closures.
    ///
    /// # Errors
    /// `InvalidInput` naming the index of the first branch that is not a
    /// scalar value.
    #[instrument(level = "debug", skip_all, fields(branches = self.branches.len(), entries = self.entries.len()))]
    pub fn build(self) -> DomainResult<ClosureEngine> {
        let mut branches: Vec<BranchName> = Vec::with_capacity(self.branches.len());
        let mut positions = HashMap::new();
        for (idx, value) in self.branches.iter().enumerate() {
            let name = BranchName::from_value(value, Some(idx))?;
            if !positions.contains_key(&name) {
                positions.insert(name.clone(), branches.len());
                branches.push(name);
            }
        }

        let entries = EntryTable::normalize(self.entries, &branches);

        let parallel =
            self.settings.parallel && entries.len() >= self.settings.parallel_threshold;
        debug!(
            parallel,
            branches = %branches.iter().join(", "),
            "Precomputing closures"
        );

        let closures = (0..branches.len())
            .map(|branch| compute_branch(&entries, branch, parallel))
            .collect();

        Ok(ClosureEngine {
            branches,
            positions,
            entries,
            closures,
        })
    }
}

fn compute_branch(entries: &EntryTable, branch: usize, parallel: bool) -> BTreeMap<Key, Closure> {
    let traversal = Traversal::new(entries, branch);
    if parallel {
        let ids: Vec<&Key> = entries.ids().collect();
        ids.par_iter()
            .map(|id| ((*id).clone(), traversal.run(id)))
            .collect()
    } else {
        entries
            .ids()
            .map(|id| (id.clone(), traversal.run(id)))
            .collect()
    }
}

impl ClosureEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Build an engine with default settings.
    pub fn new<I, K, V, BI, B>(entries: I, branches: BI) -> DomainResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
        BI: IntoIterator<Item = B>,
        B: Into<Value>,
    {
        EngineBuilder::new()
            .branches(branches)
            .entries(entries)
            .build()
    }

    /// Declared branches, deduplicated, in declaration order.
    pub fn branches(&self) -> &[BranchName] {
        &self.branches
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: impl Into<Key>) -> bool {
        self.entries.contains(&id.into())
    }

    /// Everything reachable from `ids` along `branch`, excluding each id's
    /// own origin. Ids that are not entries contribute nothing.
    ///
    /// # Errors
    /// `InvalidInput` if `branch` is not a scalar, `UnknownBranch` if it was
    /// not declared.
    #[instrument(level = "debug", skip_all)]
    pub fn related_by<B, I, K>(&self, branch: B, ids: I) -> DomainResult<BTreeSet<Key>>
    where
        B: Into<Value>,
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let position = self.position(&branch.into())?;
        let ids: Vec<Key> = ids.into_iter().map(Into::into).collect();
        Ok(self.union_of(position, &ids))
    }

    /// The ids themselves plus everything related to them on any branch.
    #[instrument(level = "debug", skip_all)]
    pub fn related_to<I, K>(&self, ids: I) -> BTreeSet<Key>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let ids: Vec<Key> = ids.into_iter().map(Into::into).collect();
        let mut related: BTreeSet<Key> = ids.iter().cloned().collect();
        for position in 0..self.branches.len() {
            related.extend(self.union_of(position, &ids));
        }
        related
    }

    /// Like [`related_to`](Self::related_to), restricted to `branches`.
    ///
    /// # Errors
    /// Same as [`related_by`](Self::related_by) for the first offending branch.
    #[instrument(level = "debug", skip_all)]
    pub fn related_to_branches<I, K, BI, B>(&self, ids: I, branches: BI) -> DomainResult<BTreeSet<Key>>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
        BI: IntoIterator<Item = B>,
        B: Into<Value>,
    {
        let positions = branches
            .into_iter()
            .map(|branch| self.position(&branch.into()))
            .collect::<DomainResult<Vec<_>>>()?;

        let ids: Vec<Key> = ids.into_iter().map(Into::into).collect();
        let mut related: BTreeSet<Key> = ids.iter().cloned().collect();
        for position in positions {
            related.extend(self.union_of(position, &ids));
        }
        Ok(related)
    }

    /// Normalized direct relations of `id` on `branch`; empty for unknown ids.
    pub fn direct<B>(&self, branch: B, id: impl Into<Key>) -> DomainResult<Vec<Key>>
    where
        B: Into<Value>,
    {
        let position = self.position(&branch.into())?;
        Ok(self
            .entries
            .direct(&id.into(), position)
            .map(<[Key]>::to_vec)
            .unwrap_or_default())
    }

    /// Render the closure of `id` along `branch` as a tree.
    ///
    /// Returns `None` if `id` is not an entry.
    pub fn traversal_tree<B>(&self, branch: B, id: impl Into<Key>) -> DomainResult<Option<Tree<String>>>
    where
        B: Into<Value>,
    {
        let position = self.position(&branch.into())?;
        Ok(self.closures[position]
            .get(&id.into())
            .map(TreeConvert::to_tree_string))
    }

    fn position(&self, branch: &Value) -> DomainResult<usize> {
        let name = BranchName::from_value(branch, None)?;
        self.positions
            .get(&name)
            .copied()
            .ok_or_else(|| DomainError::UnknownBranch(name.to_string()))
    }

    fn union_of(&self, position: usize, ids: &[Key]) -> BTreeSet<Key> {
        let closures = &self.closures[position];
        let related: BTreeSet<Key> = ids
            .iter()
            .filter_map(|id| closures.get(id))
            .flat_map(Closure::ids)
            .cloned()
            .collect();
        trace!(branch = %self.branches[position], ids = ids.len(), related = related.len(), "Union of closures");
        related
    }
}
