// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;

use super::ids::ElementId;

/// A vertex (state) of a test model, keyed by its canonical id.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: ElementId,
    label: String,
    model_name: String,
    data: Option<serde_json::Value>,
}

impl Node {
    pub fn new(id: ElementId, label: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            model_name: model_name.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Option<serde_json::Value>) -> Self {
        self.data = data;
        self
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }
}

/// A directed transition between two canonical vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    id: ElementId,
    label: String,
    source: ElementId,
    target: ElementId,
    model_name: String,
}

impl Edge {
    pub fn new(
        id: ElementId,
        label: impl Into<String>,
        source: ElementId,
        target: ElementId,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            source,
            target,
            model_name: model_name.into(),
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &ElementId {
        &self.source
    }

    pub fn target(&self) -> &ElementId {
        &self.target
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Vertex,
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Node(usize),
    Edge(usize),
}

/// The canonical node/edge snapshot of one run.
///
/// Nodes and edges keep traversal order; the index only accelerates lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<ElementId, Slot>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node. Returns `false` (and leaves the graph untouched) if the id is taken.
    pub fn push_node(&mut self, node: Node) -> bool {
        if self.index.contains_key(node.id()) {
            return false;
        }
        self.index.insert(node.id().clone(), Slot::Node(self.nodes.len()));
        self.nodes.push(node);
        true
    }

    /// Appends an edge. Both endpoints must already be nodes of this graph.
    pub fn push_edge(&mut self, edge: Edge) -> bool {
        if self.index.contains_key(edge.id()) {
            return false;
        }
        if self.kind_of(edge.source().as_str()) != Some(ElementKind::Vertex)
            || self.kind_of(edge.target().as_str()) != Some(ElementKind::Vertex)
        {
            return false;
        }
        self.index.insert(edge.id().clone(), Slot::Edge(self.edges.len()));
        self.edges.push(edge);
        true
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn kind_of(&self, id: &str) -> Option<ElementKind> {
        match self.index.get(id)? {
            Slot::Node(_) => Some(ElementKind::Vertex),
            Slot::Edge(_) => Some(ElementKind::Edge),
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        match self.index.get(id)? {
            Slot::Node(idx) => self.nodes.get(*idx),
            Slot::Edge(_) => None,
        }
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        match self.index.get(id)? {
            Slot::Edge(idx) => self.edges.get(*idx),
            Slot::Node(_) => None,
        }
    }

    /// Owning model name of any element.
    pub fn model_name_of(&self, id: &str) -> Option<&str> {
        match self.index.get(id)? {
            Slot::Node(idx) => self.nodes.get(*idx).map(Node::model_name),
            Slot::Edge(idx) => self.edges.get(*idx).map(Edge::model_name),
        }
    }

    /// Display label of any element.
    pub fn label_of(&self, id: &str) -> Option<&str> {
        match self.index.get(id)? {
            Slot::Node(idx) => self.nodes.get(*idx).map(Node::label),
            Slot::Edge(idx) => self.edges.get(*idx).map(Edge::label),
        }
    }
}
