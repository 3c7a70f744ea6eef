//! Prerequisite graph module.
//!
//! Provides `PrerequisiteGraph`, a directed acyclic graph of trait
//! prerequisites. The registry builds one at load time to reject content
//! whose prerequisites are dangling or circular, and keeps it around to
//! answer "what must be acquired before this trait".

use crate::error::LoadError;
use crate::id::TraitId;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A DAG of trait prerequisites.
///
/// Nodes are `TraitId`s. An edge runs from a prerequisite to the trait that
/// requires it, so a topological order lists prerequisites first.
///
/// # Examples
///
/// ```rust
/// use trait_engine::graph::PrerequisiteGraph;
/// use trait_engine::TraitId;
///
/// let mut graph = PrerequisiteGraph::new();
/// let novice = TraitId::new("novice");
/// let adept = TraitId::new("adept");
///
/// // adept requires novice
/// graph.add_requirement(adept.clone(), novice.clone());
///
/// let order = graph.topological_sort().unwrap();
/// let novice_pos = order.iter().position(|t| t == &novice).unwrap();
/// let adept_pos = order.iter().position(|t| t == &adept).unwrap();
/// assert!(novice_pos < adept_pos);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrerequisiteGraph {
    graph: DiGraph<TraitId, ()>,
    node_map: HashMap<TraitId, NodeIndex>,
}

impl PrerequisiteGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trait node if it doesn't exist yet and return its index.
    pub fn add_node(&mut self, trait_id: TraitId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&trait_id) {
            idx
        } else {
            let idx = self.graph.add_node(trait_id.clone());
            self.node_map.insert(trait_id, idx);
            idx
        }
    }

    /// Record that `dependent` requires `prerequisite`.
    ///
    /// Both nodes are added if missing.
    pub fn add_requirement(&mut self, dependent: TraitId, prerequisite: TraitId) {
        let dependent_idx = self.add_node(dependent);
        let prerequisite_idx = self.add_node(prerequisite);
        self.graph.update_edge(prerequisite_idx, dependent_idx, ());
    }

    /// Check if a trait is part of the graph.
    pub fn contains(&self, trait_id: &TraitId) -> bool {
        self.node_map.contains_key(trait_id)
    }

    /// Number of traits in the graph.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// True if the graph holds no traits.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Detect prerequisite cycles.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the graph is acyclic
    /// * `Err(LoadError::PrerequisiteCycle)` with the cycle path otherwise
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trait_engine::graph::PrerequisiteGraph;
    /// use trait_engine::TraitId;
    ///
    /// let mut graph = PrerequisiteGraph::new();
    /// let a = TraitId::new("a");
    /// let b = TraitId::new("b");
    ///
    /// graph.add_requirement(b.clone(), a.clone());
    /// assert!(graph.detect_cycles().is_ok());
    ///
    /// graph.add_requirement(a.clone(), b.clone());
    /// assert!(graph.detect_cycles().is_err());
    /// ```
    pub fn detect_cycles(&self) -> Result<(), LoadError> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();

        // Node indices follow insertion order, which keeps the reported
        // cycle stable between runs.
        for node_idx in self.graph.node_indices() {
            if !visited.contains(&node_idx) {
                let mut path = Vec::new();
                if let Some(cycle) = self.dfs_cycle(node_idx, &mut visited, &mut on_stack, &mut path) {
                    return Err(LoadError::PrerequisiteCycle { path: cycle });
                }
            }
        }

        Ok(())
    }

    fn dfs_cycle(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        on_stack: &mut HashSet<NodeIndex>,
        path: &mut Vec<TraitId>,
    ) -> Option<Vec<TraitId>> {
        visited.insert(node);
        on_stack.insert(node);
        path.push(self.graph[node].clone());

        for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if !visited.contains(&next) {
                if let Some(cycle) = self.dfs_cycle(next, visited, on_stack, path) {
                    return Some(cycle);
                }
            } else if on_stack.contains(&next) {
                let closing = self.graph[next].clone();
                let start = path.iter().position(|id| id == &closing).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(closing);
                return Some(cycle);
            }
        }

        on_stack.remove(&node);
        path.pop();
        None
    }

    /// Order every trait so that prerequisites come before dependents.
    pub fn topological_sort(&self) -> Result<Vec<TraitId>, LoadError> {
        self.detect_cycles()?;

        toposort(&self.graph, None)
            .map(|indices| indices.into_iter().map(|idx| self.graph[idx].clone()).collect())
            .map_err(|cycle| LoadError::PrerequisiteCycle {
                path: vec![self.graph[cycle.node_id()].clone()],
            })
    }

    /// Direct prerequisites of a trait.
    pub fn direct_prerequisites(&self, trait_id: &TraitId) -> Vec<TraitId> {
        let Some(&idx) = self.node_map.get(trait_id) else {
            return Vec::new();
        };
        let mut prerequisites: Vec<TraitId> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();
        prerequisites.sort();
        prerequisites
    }

    /// All transitive prerequisites of a trait, in acquisition order.
    ///
    /// Walks incoming edges from `trait_id`, then orders the reachable set
    /// topologically. The trait itself is not included.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trait_engine::graph::PrerequisiteGraph;
    /// use trait_engine::TraitId;
    ///
    /// let mut graph = PrerequisiteGraph::new();
    /// graph.add_requirement("master".into(), "adept".into());
    /// graph.add_requirement("adept".into(), "novice".into());
    /// graph.add_node("unrelated".into());
    ///
    /// let chain = graph.prerequisite_chain(&TraitId::new("master")).unwrap();
    /// assert_eq!(chain, vec![TraitId::new("novice"), TraitId::new("adept")]);
    /// ```
    pub fn prerequisite_chain(&self, trait_id: &TraitId) -> Result<Vec<TraitId>, LoadError> {
        let mut sub = PrerequisiteGraph::new();
        let mut visited = HashSet::new();
        let mut stack = vec![trait_id.clone()];

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Some(&idx) = self.node_map.get(&current) else {
                continue;
            };
            sub.add_node(current.clone());
            for prereq_idx in self.graph.neighbors_directed(idx, Direction::Incoming) {
                let prereq = self.graph[prereq_idx].clone();
                if !visited.contains(&prereq) {
                    stack.push(prereq.clone());
                }
                sub.add_requirement(current.clone(), prereq);
            }
        }

        Ok(sub
            .topological_sort()?
            .into_iter()
            .filter(|id| id != trait_id)
            .collect())
    }
}
