//! Step registry
//!
//! Provides [`StepRegistry`], the ordered and branching catalog of steps, and
//! [`StepRegistryBuilder`] which validates a catalog before it is used.
//!
//! # Successor rule
//! - Steps whose `predecessor` is `s` are the successors of `s`. More than one
//!   makes `s` a gateway.
//! - Otherwise a branch step continues with the next later step of its own
//!   branch group that has no explicit predecessor.
//! - Otherwise the next later mainline step without an explicit predecessor.

use crate::error::RegistryError;
use crate::step::{PersistenceMode, StepDescriptor, StepId};
use indexmap::IndexMap;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use petgraph::Direction;
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap};

/// Successor list; one entry except at gateways
pub type Successors = SmallVec<[StepId; 2]>;

/// Validated step catalog
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: IndexMap<StepId, StepDescriptor>,
    successors: HashMap<StepId, Successors>,
    graph: DiGraphMap<StepId, ()>,
    terminal: StepId,
}

impl StepRegistry {
    /// Start building a registry
    #[inline]
    #[must_use]
    pub fn builder() -> StepRegistryBuilder {
        StepRegistryBuilder::new()
    }

    /// Look up a descriptor
    ///
    /// # Errors
    /// - `RegistryError::NotFound` if the id is unknown
    pub fn get(&self, id: StepId) -> Result<&StepDescriptor, RegistryError> {
        self.steps.get(&id).ok_or(RegistryError::NotFound(id))
    }

    /// Check if a step is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, id: StepId) -> bool {
        self.steps.contains_key(&id)
    }

    /// First step in registry order
    #[inline]
    #[must_use]
    pub fn first(&self) -> StepId {
        // Builder rejects empty registries
        *self.steps.keys().next().unwrap_or(&self.terminal)
    }

    /// Designated terminal step
    #[inline]
    #[must_use]
    pub fn terminal(&self) -> StepId {
        self.terminal
    }

    /// Number of registered steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a built registry
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Descriptors in registry order
    pub fn iter(&self) -> impl Iterator<Item = &StepDescriptor> {
        self.steps.values()
    }

    /// Step ids in registry order
    pub fn ids(&self) -> impl Iterator<Item = StepId> + '_ {
        self.steps.keys().copied()
    }

    /// Zero-based position in registry order
    #[inline]
    #[must_use]
    pub fn position(&self, id: StepId) -> Option<usize> {
        self.steps.get_index_of(&id)
    }

    /// All direct successors of a step
    ///
    /// # Errors
    /// - `RegistryError::NotFound` if the id is unknown
    pub fn successors(&self, id: StepId) -> Result<&[StepId], RegistryError> {
        if !self.contains(id) {
            return Err(RegistryError::NotFound(id));
        }
        Ok(self.successors.get(&id).map_or(&[][..], |s| s.as_slice()))
    }

    /// First successor of a step, `None` at the end of the journey
    ///
    /// # Errors
    /// - `RegistryError::NotFound` if the id is unknown
    pub fn next(&self, id: StepId) -> Result<Option<StepId>, RegistryError> {
        Ok(self.successors(id)?.first().copied())
    }

    /// Steps that unlock this step when completed
    ///
    /// # Errors
    /// - `RegistryError::NotFound` if the id is unknown
    pub fn predecessors(&self, id: StepId) -> Result<Vec<StepId>, RegistryError> {
        if !self.contains(id) {
            return Err(RegistryError::NotFound(id));
        }
        let mut preds: Vec<StepId> = self
            .graph
            .neighbors_directed(id, Direction::Incoming)
            .collect();
        preds.sort_by_key(|p| self.position(*p));
        Ok(preds)
    }

    /// Whether completing this step opens more than one successor
    #[inline]
    #[must_use]
    pub fn is_gateway(&self, id: StepId) -> bool {
        self.successors.get(&id).is_some_and(|s| s.len() > 1)
    }

    /// Steps of a branch group in registry order
    ///
    /// Unknown groups yield an empty list.
    #[must_use]
    pub fn steps_in_branch(&self, group: &str) -> Vec<StepId> {
        self.steps
            .values()
            .filter(|d| d.branch_group.as_deref() == Some(group))
            .map(|d| d.id)
            .collect()
    }

    /// Distinct branch group names in registry order
    #[must_use]
    pub fn branch_groups(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for group in self.steps.values().filter_map(|d| d.branch_group.as_deref()) {
            if !seen.contains(&group) {
                seen.push(group);
            }
        }
        seen
    }

    /// Steps not reachable from [`Self::first`]
    #[must_use]
    pub fn unreachable(&self) -> Vec<StepId> {
        let mut reached = BTreeSet::new();
        let mut dfs = Dfs::new(&self.graph, self.first());
        while let Some(node) = dfs.next(&self.graph) {
            reached.insert(node);
        }
        self.ids().filter(|id| !reached.contains(id)).collect()
    }
}

/// Builder that validates a catalog into a [`StepRegistry`]
#[derive(Debug, Default, Clone)]
pub struct StepRegistryBuilder {
    steps: Vec<StepDescriptor>,
    terminal: Option<StepId>,
}

impl StepRegistryBuilder {
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step; registry order is insertion order
    #[inline]
    #[must_use]
    pub fn step(mut self, descriptor: StepDescriptor) -> Self {
        self.steps.push(descriptor);
        self
    }

    /// Append several steps
    #[must_use]
    pub fn steps(mut self, descriptors: impl IntoIterator<Item = StepDescriptor>) -> Self {
        self.steps.extend(descriptors);
        self
    }

    /// Designate the terminal step (defaults to the last step)
    #[inline]
    #[must_use]
    pub fn terminal(mut self, id: StepId) -> Self {
        self.terminal = Some(id);
        self
    }

    /// Validate and build
    ///
    /// # Errors
    /// Any [`RegistryError`] other than `NotFound`.
    pub fn build(self) -> Result<StepRegistry, RegistryError> {
        let last = self.steps.last().map(|d| d.id).ok_or(RegistryError::Empty)?;

        let mut steps = IndexMap::with_capacity(self.steps.len());
        for descriptor in self.steps {
            let id = descriptor.id;
            if steps.insert(id, descriptor).is_some() {
                return Err(RegistryError::DuplicateStep(id));
            }
        }

        validate_predecessors(&steps)?;
        validate_branches(&steps)?;
        validate_tables(&steps)?;

        let terminal = match self.terminal {
            Some(t) if !steps.contains_key(&t) => return Err(RegistryError::UnknownTerminal(t)),
            Some(t) => t,
            None => last,
        };

        let ordered: Vec<&StepDescriptor> = steps.values().collect();
        let mut successors = HashMap::with_capacity(ordered.len());
        let mut graph = DiGraphMap::new();
        for (idx, step) in ordered.iter().enumerate() {
            graph.add_node(step.id);
            let next = derive_successors(&ordered, idx);
            for s in &next {
                graph.add_edge(step.id, *s, ());
            }
            successors.insert(step.id, next);
        }

        if let Err(cycle) = petgraph::algo::toposort(&graph, None) {
            return Err(RegistryError::Cycle(cycle.node_id()));
        }

        let registry = StepRegistry {
            steps,
            successors,
            graph,
            terminal,
        };

        let unreachable = registry.unreachable();
        if !unreachable.is_empty() {
            tracing::warn!(?unreachable, "registry contains steps unreachable from the first step");
        }
        tracing::debug!(
            steps = registry.len(),
            terminal = %registry.terminal,
            "step registry built"
        );

        Ok(registry)
    }
}

fn validate_predecessors(steps: &IndexMap<StepId, StepDescriptor>) -> Result<(), RegistryError> {
    for d in steps.values() {
        match d.predecessor {
            Some(p) if p == d.id => return Err(RegistryError::SelfPredecessor(d.id)),
            Some(p) if !steps.contains_key(&p) => {
                return Err(RegistryError::MissingPredecessor {
                    step: d.id,
                    predecessor: p,
                })
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_branches(steps: &IndexMap<StepId, StepDescriptor>) -> Result<(), RegistryError> {
    let mut entered: Vec<&str> = Vec::new();
    for d in steps.values() {
        let Some(group) = d.branch_group.as_deref() else {
            continue;
        };
        if entered.contains(&group) {
            continue;
        }
        if d.follows_order() {
            return Err(RegistryError::BranchWithoutEntry(group.to_string()));
        }
        entered.push(group);
    }
    Ok(())
}

fn validate_tables(steps: &IndexMap<StepId, StepDescriptor>) -> Result<(), RegistryError> {
    let mut owners: HashMap<&str, &StepDescriptor> = HashMap::new();
    for d in steps.values() {
        if let Some(first) = owners.get(d.storage_table.as_str()) {
            let keyed = first.persistence == PersistenceMode::CurrentPerUserStep
                && d.persistence == PersistenceMode::CurrentPerUserStep;
            if !keyed {
                return Err(RegistryError::TableConflict {
                    table: d.storage_table.clone(),
                    first: first.id,
                    second: d.id,
                });
            }
        } else {
            owners.insert(d.storage_table.as_str(), d);
        }
    }
    Ok(())
}

fn derive_successors(ordered: &[&StepDescriptor], idx: usize) -> Successors {
    let step = ordered[idx];

    let explicit: Successors = ordered
        .iter()
        .filter(|d| d.predecessor == Some(step.id))
        .map(|d| d.id)
        .collect();
    if !explicit.is_empty() {
        return explicit;
    }

    let later = &ordered[idx + 1..];
    if let Some(group) = step.branch_group.as_deref() {
        if let Some(d) = later
            .iter()
            .find(|d| d.follows_order() && d.branch_group.as_deref() == Some(group))
        {
            return smallvec::smallvec![d.id];
        }
    }

    later
        .iter()
        .find(|d| d.follows_order() && !d.is_branch())
        .map(|d| smallvec::smallvec![d.id])
        .unwrap_or_default()
}
