// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Ratatui rendering surface for the live graph.

use std::collections::{BTreeSet, HashMap};

use ratatui::text::{Line, Span};

use super::theme::TuiTheme;
use crate::model::{Edge, ElementId, Node};
use crate::render::{layer_graph, GraphLayout, RenderBridge};

const VERTEX_GAP: &str = "   ";

/// Keeps the displayed graph plus per-element paint state; drawing reads from here.
#[derive(Debug, Clone, Default)]
pub struct TerminalSurface {
    theme: TuiTheme,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    layout: GraphLayout,
    counts: HashMap<ElementId, u32>,
    highlighted: BTreeSet<ElementId>,
    failed: BTreeSet<ElementId>,
    scroll_x: u16,
    scroll_y: u16,
}

impl TerminalSurface {
    pub(crate) fn new(theme: TuiTheme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    pub(crate) fn theme(&self) -> TuiTheme {
        self.theme
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn layout(&self) -> &GraphLayout {
        &self.layout
    }

    pub fn count(&self, id: &str) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn is_highlighted(&self, id: &str) -> bool {
        self.highlighted.contains(id)
    }

    pub fn is_failed(&self, id: &str) -> bool {
        self.failed.contains(id)
    }

    /// `(x, y)` offset of the graph pane.
    pub fn scroll(&self) -> (u16, u16) {
        (self.scroll_x, self.scroll_y)
    }

    pub fn scroll_by(&mut self, dx: i32, dy: i32) {
        let width = self.graph_width();
        let height = self.graph_lines().len();
        self.scroll_x = offset(self.scroll_x, dx, width);
        self.scroll_y = offset(self.scroll_y, dy, height);
    }

    fn is_displayed(&self, id: &ElementId) -> bool {
        self.layout.placement(id.as_str()).is_some()
            || self.edges.iter().any(|edge| edge.id() == id)
    }

    fn element_style(&self, id: &ElementId) -> ratatui::style::Style {
        self.theme.element_style(
            self.count(id.as_str()),
            self.highlighted.contains(id),
            self.failed.contains(id),
        )
    }

    fn vertex_text(node: &Node, count: u32) -> String {
        format!("[{} ×{count}]", node.label())
    }

    fn graph_width(&self) -> usize {
        self.graph_lines().iter().map(Line::width).max().unwrap_or(0)
    }

    /// One line per layer, with a connector line between consecutive layers.
    pub(crate) fn graph_lines(&self) -> Vec<Line<'static>> {
        let by_id = self
            .nodes
            .iter()
            .map(|node| (node.id(), node))
            .collect::<HashMap<_, _>>();

        let mut lines = Vec::new();
        for (layer_idx, layer) in self.layout.layers().iter().enumerate() {
            if layer_idx > 0 {
                lines.push(Line::styled("  ↓", self.theme.label_style()));
            }
            let mut spans = Vec::with_capacity(layer.len() * 2);
            for (idx, id) in layer.iter().enumerate() {
                let Some(node) = by_id.get(id) else {
                    continue;
                };
                if idx > 0 {
                    spans.push(Span::raw(VERTEX_GAP));
                }
                spans.push(Span::styled(
                    Self::vertex_text(node, self.count(id.as_str())),
                    self.element_style(id),
                ));
            }
            lines.push(Line::from(spans));
        }
        lines
    }

    pub(crate) fn edge_lines(&self) -> Vec<Line<'static>> {
        let label_of = |id: &ElementId| -> String {
            self.nodes
                .iter()
                .find(|node| node.id() == id)
                .map_or_else(|| id.to_string(), |node| node.label().to_owned())
        };
        self.edges
            .iter()
            .map(|edge| {
                Line::from(vec![
                    Span::styled(edge.label().to_owned(), self.element_style(edge.id())),
                    Span::styled(
                        format!(
                            "  {} → {}  ×{}",
                            label_of(edge.source()),
                            label_of(edge.target()),
                            self.count(edge.id().as_str())
                        ),
                        self.theme.label_style(),
                    ),
                ])
            })
            .collect()
    }
}

impl RenderBridge for TerminalSurface {
    fn rebuild_graph(&mut self, nodes: &[Node], edges: &[Edge]) {
        self.nodes = nodes.to_vec();
        self.edges = edges.to_vec();
        self.layout = layer_graph(nodes, edges);
        self.counts.clear();
        self.highlighted.clear();
        self.failed.clear();
    }

    fn set_highlight(&mut self, id: &ElementId, on: bool) {
        if !self.is_displayed(id) {
            return;
        }
        if on {
            self.highlighted.insert(id.clone());
        } else {
            self.highlighted.remove(id);
        }
    }

    fn set_visit_color(&mut self, id: &ElementId, count: u32) {
        if self.is_displayed(id) {
            self.counts.insert(id.clone(), count);
        }
    }

    fn set_failed(&mut self, id: &ElementId) {
        if self.is_displayed(id) {
            self.failed.insert(id.clone());
        }
    }

    fn refresh_viewport(&mut self) {
        self.layout = layer_graph(&self.nodes, &self.edges);
        self.scroll_x = 0;
        self.scroll_y = 0;
    }
}

fn offset(current: u16, delta: i32, extent: usize) -> u16 {
    let max = i64::try_from(extent.saturating_sub(1)).unwrap_or(i64::MAX);
    let next = (i64::from(current) + i64::from(delta)).clamp(0, max.max(0));
    u16::try_from(next).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use ratatui::style::Modifier;

    use super::TerminalSurface;
    use crate::model::{Edge, ElementId, Node};
    use crate::render::RenderBridge;

    fn id(value: &str) -> ElementId {
        ElementId::new(value).expect("id")
    }

    fn surface() -> TerminalSurface {
        let nodes = vec![
            Node::new(id("A"), "A", "M"),
            Node::new(id("B"), "B", "M"),
        ];
        let edges = vec![Edge::new(id("go"), "go", id("A"), id("B"), "M")];
        let mut surface = TerminalSurface::default();
        surface.rebuild_graph(&nodes, &edges);
        surface.refresh_viewport();
        surface
    }

    fn text(line: &ratatui::text::Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn graph_lines_show_layers_and_counts() {
        let mut surface = surface();
        surface.set_visit_color(&id("A"), 2);

        let lines = surface.graph_lines().iter().map(text).collect::<Vec<_>>();
        assert_eq!(lines, vec!["[A ×2]", "  ↓", "[B ×0]"]);
    }

    #[test]
    fn edge_lines_show_endpoints_and_count() {
        let mut surface = surface();
        surface.set_visit_color(&id("go"), 3);
        let lines = surface.edge_lines().iter().map(text).collect::<Vec<_>>();
        assert_eq!(lines, vec!["go  A → B  ×3"]);
    }

    #[test]
    fn current_element_is_reversed() {
        let mut surface = surface();
        surface.set_highlight(&id("B"), true);
        let lines = surface.graph_lines();
        let span = &lines[2].spans[0];
        assert!(span.style.add_modifier.contains(Modifier::REVERSED));

        surface.set_highlight(&id("B"), false);
        assert!(!surface.is_highlighted("B"));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut surface = surface();
        surface.set_highlight(&id("ghost"), true);
        surface.set_failed(&id("ghost"));
        surface.set_visit_color(&id("ghost"), 1);
        assert!(!surface.is_highlighted("ghost"));
        assert!(!surface.is_failed("ghost"));
        assert_eq!(surface.count("ghost"), 0);
    }

    #[test]
    fn rebuild_drops_paint_state_and_refresh_resets_scroll() {
        let mut surface = surface();
        surface.set_failed(&id("A"));
        surface.scroll_by(2, 1);
        assert_eq!(surface.scroll(), (2, 1));

        surface.refresh_viewport();
        assert_eq!(surface.scroll(), (0, 0));
        assert!(surface.is_failed("A"));

        surface.rebuild_graph(&[], &[]);
        assert!(!surface.is_failed("A"));
        assert!(surface.graph_lines().is_empty());
    }

    #[test]
    fn scrolling_is_clamped_to_content() {
        let mut surface = surface();
        surface.scroll_by(-5, -5);
        assert_eq!(surface.scroll(), (0, 0));
        surface.scroll_by(100, 100);
        assert_eq!(surface.scroll(), (5, 2));
    }
}
