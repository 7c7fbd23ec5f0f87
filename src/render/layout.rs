// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use crate::model::{Edge, ElementId, Node};

/// Layered placement of vertices, one row per layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphLayout {
    layers: Vec<Vec<ElementId>>,
    placements: HashMap<ElementId, NodePlacement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePlacement {
    pub layer: usize,
    pub index_in_layer: usize,
}

impl GraphLayout {
    pub fn layers(&self) -> &[Vec<ElementId>] {
        &self.layers
    }

    pub fn placement(&self, id: &str) -> Option<NodePlacement> {
        self.placements.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Height of the tallest layer.
    pub fn depth(&self) -> usize {
        self.layers.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Breadth-first layering that tolerates cycles (test models are usually cyclic).
///
/// Sources (no incoming edges other than self loops) seed layer 0 in traversal order; vertices
/// unreachable from any source start a fresh BFS at layer 0. Each layer after the first gets one
/// barycenter sweep against the layer before it.
pub fn layer_graph(nodes: &[Node], edges: &[Edge]) -> GraphLayout {
    if nodes.is_empty() {
        return GraphLayout::default();
    }

    let index = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id().as_str(), idx))
        .collect::<HashMap<_, _>>();

    let mut outgoing = vec![Vec::<usize>::new(); nodes.len()];
    let mut predecessors = vec![Vec::<usize>::new(); nodes.len()];
    let mut indegree = vec![0usize; nodes.len()];
    for edge in edges {
        let (Some(&from), Some(&to)) =
            (index.get(edge.source().as_str()), index.get(edge.target().as_str()))
        else {
            continue;
        };
        outgoing[from].push(to);
        predecessors[to].push(from);
        if from != to {
            indegree[to] += 1;
        }
    }

    let mut layer_of = vec![None::<usize>; nodes.len()];
    let mut queue = VecDeque::<usize>::new();
    for (idx, degree) in indegree.iter().enumerate() {
        if *degree == 0 {
            layer_of[idx] = Some(0);
            queue.push_back(idx);
        }
    }

    loop {
        while let Some(from) = queue.pop_front() {
            let next_layer = layer_of[from].unwrap_or(0) + 1;
            for &to in &outgoing[from] {
                if layer_of[to].is_none() {
                    layer_of[to] = Some(next_layer);
                    queue.push_back(to);
                }
            }
        }
        let Some(seed) = layer_of.iter().position(Option::is_none) else {
            break;
        };
        layer_of[seed] = Some(0);
        queue.push_back(seed);
    }

    let layer_count = layer_of.iter().flatten().max().map_or(0, |max| max + 1);
    let mut layers = vec![Vec::<usize>::new(); layer_count];
    for (idx, layer) in layer_of.iter().enumerate() {
        layers[layer.unwrap_or(0)].push(idx);
    }

    for layer_idx in 1..layers.len() {
        let (before, after) = layers.split_at_mut(layer_idx);
        let prev_positions = before[layer_idx - 1]
            .iter()
            .enumerate()
            .map(|(pos, idx)| (*idx, pos))
            .collect::<HashMap<_, _>>();
        sort_layer_by_barycenter(&mut after[0], &prev_positions, &predecessors);
    }

    let mut placements = HashMap::new();
    let layers = layers
        .into_iter()
        .enumerate()
        .map(|(layer, members)| {
            members
                .into_iter()
                .enumerate()
                .map(|(index_in_layer, idx)| {
                    let id = nodes[idx].id().clone();
                    placements.insert(id.clone(), NodePlacement { layer, index_in_layer });
                    id
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    GraphLayout { layers, placements }
}

fn barycenter(
    node: usize,
    prev_positions: &HashMap<usize, usize>,
    predecessors: &[Vec<usize>],
) -> Option<(usize, usize)> {
    let (sum, count) = predecessors[node]
        .iter()
        .filter_map(|pred| prev_positions.get(pred).copied())
        .fold((0usize, 0usize), |(sum, count), pos| (sum + pos, count + 1));
    (count > 0).then_some((sum, count))
}

fn sort_layer_by_barycenter(
    layer: &mut [usize],
    prev_positions: &HashMap<usize, usize>,
    predecessors: &[Vec<usize>],
) {
    layer.sort_by(|a, b| {
        match (
            barycenter(*a, prev_positions, predecessors),
            barycenter(*b, prev_positions, predecessors),
        ) {
            (None, None) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((sum_a, count_a)), Some((sum_b, count_b))) => {
                let left = (sum_a as u128) * (count_b as u128);
                let right = (sum_b as u128) * (count_a as u128);
                left.cmp(&right).then_with(|| a.cmp(b))
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::layer_graph;
    use crate::model::{Edge, ElementId, Node};

    fn id(value: &str) -> ElementId {
        ElementId::new(value).expect("element id")
    }

    fn nodes(names: &[&str]) -> Vec<Node> {
        names.iter().map(|name| Node::new(id(name), *name, "M")).collect()
    }

    fn edge(name: &str, from: &str, to: &str) -> Edge {
        Edge::new(id(name), name, id(from), id(to), "M")
    }

    fn layer_names(layout: &super::GraphLayout) -> Vec<Vec<&str>> {
        layout
            .layers()
            .iter()
            .map(|layer| layer.iter().map(|id| id.as_str()).collect())
            .collect()
    }

    #[test]
    fn empty_graph_has_no_layers() {
        let layout = layer_graph(&[], &[]);
        assert!(layout.is_empty());
        assert_eq!(layout.depth(), 0);
    }

    #[test]
    fn chain_gets_one_layer_per_vertex() {
        let layout = layer_graph(
            &nodes(&["A", "B", "C"]),
            &[edge("ab", "A", "B"), edge("bc", "B", "C")],
        );
        assert_eq!(layer_names(&layout), vec![vec!["A"], vec!["B"], vec!["C"]]);
        assert_eq!(layout.placement("C").map(|p| p.layer), Some(2));
    }

    #[test]
    fn pure_cycle_is_seeded_from_first_vertex() {
        let layout = layer_graph(
            &nodes(&["A", "B"]),
            &[edge("ab", "A", "B"), edge("ba", "B", "A")],
        );
        assert_eq!(layer_names(&layout), vec![vec!["A"], vec!["B"]]);
    }

    #[test]
    fn self_loops_do_not_block_sources() {
        let layout = layer_graph(
            &nodes(&["A", "B"]),
            &[edge("aa", "A", "A"), edge("ab", "A", "B")],
        );
        assert_eq!(layer_names(&layout), vec![vec!["A"], vec!["B"]]);
    }

    #[test]
    fn barycenter_orders_children_under_parents() {
        let layout = layer_graph(
            &nodes(&["P1", "P2", "C2", "C1"]),
            &[edge("a", "P1", "C1"), edge("b", "P2", "C2")],
        );
        assert_eq!(layer_names(&layout), vec![vec!["P1", "P2"], vec!["C1", "C2"]]);
    }

    #[test]
    fn every_vertex_is_placed_once() {
        let layout = layer_graph(
            &nodes(&["A", "B", "C", "D"]),
            &[edge("ab", "A", "B"), edge("cd", "C", "D"), edge("dc", "D", "C")],
        );
        let placed = layout.layers().iter().map(Vec::len).sum::<usize>();
        assert_eq!(placed, 4);
        for name in ["A", "B", "C", "D"] {
            assert!(layout.placement(name).is_some(), "{name} placed");
        }
    }
}
