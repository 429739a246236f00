//! Gate dependency graph.
//!
//! Nodes are gate positions; an edge `a -> b` labelled with qubit `q` means
//! `b` is the next gate after `a` touching `q`. Edges are derived from a
//! per-qubit last-touch array in a single pass over the gate list.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use qtrig_ir::{Gate, QubitId};

use crate::error::{SchedError, SchedResult};

/// Data dependencies between the gates of one kernel.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<usize, QubitId, u32>,
    nodes: Vec<NodeIndex<u32>>,
}

impl DependencyGraph {
    /// Build the graph for `gates` in program order.
    pub fn build(gates: &[Gate]) -> Self {
        let mut graph = DiGraph::with_capacity(gates.len(), gates.len());
        let mut nodes = Vec::with_capacity(gates.len());
        let mut last_touch: Vec<Option<NodeIndex<u32>>> = vec![];

        for (position, gate) in gates.iter().enumerate() {
            let node = graph.add_node(position);
            for &qubit in &gate.qubits {
                let slot = qubit.index();
                if slot >= last_touch.len() {
                    last_touch.resize(slot + 1, None);
                }
                if let Some(prev) = last_touch[slot] {
                    graph.add_edge(prev, node, qubit);
                }
                last_touch[slot] = Some(node);
            }
            nodes.push(node);
        }

        Self { graph, nodes }
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the graph has no gates.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of dependency edges.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Positions of gates that must finish before `position` starts.
    pub fn predecessors(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbors(position, Direction::Incoming)
    }

    /// Positions of gates that must start after `position` ends.
    pub fn successors(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbors(position, Direction::Outgoing)
    }

    fn neighbors(&self, position: usize, dir: Direction) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors_directed(self.nodes[position], dir)
            .map(|n| self.graph[n])
    }

    /// Verify the graph is acyclic and return a topological order of positions.
    pub fn topological_order(&self, kernel: &str) -> SchedResult<Vec<usize>> {
        petgraph::algo::toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|n| self.graph[n]).collect())
            .map_err(|cycle| SchedError::SchedulingConflict {
                kernel: kernel.to_string(),
                reason: format!(
                    "dependency cycle through gate at position {}",
                    self.graph[cycle.node_id()]
                ),
            })
    }
}
