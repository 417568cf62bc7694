//! Task dependency graph
//!
//! Directed graph over task IDs using petgraph: one node per task (duration
//! as node weight), one edge per dependency, predecessor → successor.
//! Dangling and self-referential dependency references are dropped at build
//! time. The graph is rebuilt from the task list for each analysis pass and
//! never cached across task mutations.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::model::Task;

/// Directed dependency graph over task IDs.
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_indices: HashMap<String, NodeIndex>,
    durations: HashMap<String, f64>,
}

impl DependencyGraph {
    /// Builds the graph from a task list.
    ///
    /// Tasks with an ID already present are skipped (first wins); dependency
    /// references to unknown IDs and self-references are dropped silently.
    pub fn build(tasks: &[Task]) -> Self {
        let mut graph = DiGraph::with_capacity(tasks.len(), tasks.len() * 2);
        let mut node_indices = HashMap::with_capacity(tasks.len());
        let mut durations = HashMap::with_capacity(tasks.len());

        for task in tasks {
            if node_indices.contains_key(&task.id) {
                debug!(id = %task.id, "duplicate task ID, keeping first node");
                continue;
            }
            let idx = graph.add_node(task.id.clone());
            node_indices.insert(task.id.clone(), idx);
            durations.insert(task.id.clone(), task.duration);
        }

        for task in tasks {
            let Some(&to) = node_indices.get(&task.id) else {
                continue;
            };
            for dep in &task.dependencies {
                if dep == &task.id {
                    debug!(id = %task.id, "dropping self-referential dependency");
                    continue;
                }
                match node_indices.get(dep) {
                    Some(&from) => {
                        // update_edge: duplicate dependency entries collapse
                        // into one edge instead of parallel edges
                        graph.update_edge(from, to, ());
                    }
                    None => {
                        debug!(id = %task.id, dep = %dep, "dropping dangling dependency reference");
                    }
                }
            }
        }

        Self { graph, node_indices, durations }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Duration weight of a node, 0 for unknown IDs.
    pub fn duration_of(&self, id: &str) -> f64 {
        self.durations.get(id).copied().unwrap_or(0.0)
    }

    /// Task IDs in insertion (task list) order.
    pub fn task_ids(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx).map(String::as_str))
            .collect()
    }

    /// IDs of nodes with no incoming edges (project-start tasks).
    pub fn sources(&self) -> Vec<&str> {
        self.degree_filtered(Direction::Incoming)
    }

    /// IDs of nodes with no outgoing edges (project-end tasks).
    pub fn sinks(&self) -> Vec<&str> {
        self.degree_filtered(Direction::Outgoing)
    }

    fn degree_filtered(&self, direction: Direction) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph.neighbors_directed(idx, direction).next().is_none())
            .filter_map(|idx| self.graph.node_weight(idx).map(String::as_str))
            .collect()
    }

    /// Immediate predecessor IDs of a task.
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.neighbor_ids(id, Direction::Incoming)
    }

    /// Immediate successor IDs of a task.
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.neighbor_ids(id, Direction::Outgoing)
    }

    fn neighbor_ids(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        self.neighbors_idx(idx, direction)
            .into_iter()
            .filter_map(|n| self.graph.node_weight(n).map(String::as_str))
            .collect()
    }

    pub(crate) fn id_of(&self, idx: NodeIndex) -> &str {
        self.graph.node_weight(idx).map(String::as_str).unwrap_or_default()
    }

    pub(crate) fn duration_idx(&self, idx: NodeIndex) -> f64 {
        self.duration_of(self.id_of(idx))
    }

    pub(crate) fn node_indices_ordered(&self) -> Vec<NodeIndex> {
        self.graph.node_indices().collect()
    }

    /// Neighbors sorted by node index so iteration order is stable and
    /// follows task insertion order.
    pub(crate) fn neighbors_idx(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> =
            self.graph.neighbors_directed(idx, direction).collect();
        neighbors.sort_by_key(|n| n.index());
        neighbors.dedup();
        neighbors
    }

    // =========================================================================
    // Cycle handling
    // =========================================================================

    /// Forces the graph acyclic, returning a topological order and the list
    /// of removed edges as (from, to) ID pairs.
    ///
    /// Heuristic: for each cycle found, the edge whose source node carries
    /// the smallest duration weight is removed (first minimal edge in cycle
    /// order wins), and the check is repeated until a topological sort
    /// succeeds. Deterministic given task insertion order; not a minimal
    /// feedback arc set.
    pub fn break_cycles(&mut self) -> (Vec<NodeIndex>, Vec<(String, String)>) {
        let mut removed = Vec::new();
        loop {
            match toposort(&self.graph, None) {
                Ok(order) => return (order, removed),
                Err(_) => {
                    let Some((u, v)) = self.find_cycle_edge() else {
                        return (Vec::new(), removed);
                    };
                    let from = self.id_of(u).to_string();
                    let to = self.id_of(v).to_string();
                    if let Some(edge) = self.graph.find_edge(u, v) {
                        self.graph.remove_edge(edge);
                    }
                    warn!(from = %from, to = %to, "removed dependency edge to break cycle");
                    removed.push((from, to));
                }
            }
        }
    }

    /// Locates one cycle and returns its minimal-source-weight edge.
    fn find_cycle_edge(&self) -> Option<(NodeIndex, NodeIndex)> {
        let cycle = self.find_cycle()?;
        let mut best: Option<(NodeIndex, NodeIndex)> = None;
        let mut best_weight = f64::INFINITY;
        for (i, &u) in cycle.iter().enumerate() {
            let v = cycle[(i + 1) % cycle.len()];
            let weight = self.duration_idx(u);
            if weight < best_weight && self.graph.find_edge(u, v).is_some() {
                best_weight = weight;
                best = Some((u, v));
            }
        }
        best
    }

    /// Walks inside the first multi-member SCC until a node repeats; the
    /// repeated suffix is a simple cycle. Self-loops cannot occur (dropped
    /// at build time), so every cycle lives in an SCC with > 1 member.
    fn find_cycle(&self) -> Option<Vec<NodeIndex>> {
        let scc = tarjan_scc(&self.graph).into_iter().find(|c| c.len() > 1)?;
        let members: HashSet<NodeIndex> = scc.iter().copied().collect();
        let mut positions: HashMap<NodeIndex, usize> = HashMap::new();
        let mut path: Vec<NodeIndex> = Vec::new();
        let mut current = *scc.iter().min_by_key(|n| n.index())?;
        loop {
            if let Some(&start) = positions.get(&current) {
                return Some(path[start..].to_vec());
            }
            positions.insert(current, path.len());
            path.push(current);
            current = self
                .neighbors_idx(current, Direction::Outgoing)
                .into_iter()
                .find(|n| members.contains(n))?;
        }
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Renders the graph as Graphviz DOT, filling nodes from `highlight`
    /// (critical-path tasks, typically) in a distinct color.
    pub fn to_dot(&self, highlight: &HashSet<String>) -> String {
        let mut output = String::new();
        output.push_str("digraph TaskGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str(
            "  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10];\n",
        );
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8];\n\n");

        for idx in self.graph.node_indices() {
            let id = self.id_of(idx);
            let color = if highlight.contains(id) { "#F44336" } else { "#90CAF9" };
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\\n{}\", fillcolor=\"{}\"];\n",
                escape(id),
                escape(id),
                self.duration_of(id),
                color
            ));
        }
        output.push('\n');

        for edge in self.graph.edge_indices() {
            if let Some((from, to)) = self.graph.edge_endpoints(edge) {
                output.push_str(&format!(
                    "  \"{}\" -> \"{}\";\n",
                    escape(self.id_of(from)),
                    escape(self.id_of(to))
                ));
            }
        }
        output.push_str("}\n");
        output
    }
}

fn escape(s: &str) -> String {
    s.replace('"', "\\\"")
}
