// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! A render bridge that records calls, for tests and transcript replays.

use std::collections::{BTreeSet, HashSet};

use super::RenderBridge;
use crate::model::{Edge, ElementId, Node};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    Rebuild {
        nodes: Vec<ElementId>,
        edges: Vec<ElementId>,
    },
    Highlight {
        id: ElementId,
        on: bool,
    },
    VisitColor {
        id: ElementId,
        count: u32,
    },
    Failed {
        id: ElementId,
    },
    RefreshViewport,
}

/// Records every call and tracks the highlight set the calls would produce on a real surface.
#[derive(Debug, Clone, Default)]
pub struct RecordingBridge {
    calls: Vec<RenderCall>,
    displayed: HashSet<ElementId>,
    highlighted: BTreeSet<ElementId>,
    failed: BTreeSet<ElementId>,
    max_highlighted: usize,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<RenderCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn highlighted(&self) -> &BTreeSet<ElementId> {
        &self.highlighted
    }

    pub fn failed(&self) -> &BTreeSet<ElementId> {
        &self.failed
    }

    /// Largest number of simultaneously highlighted elements seen so far.
    pub fn max_highlighted(&self) -> usize {
        self.max_highlighted
    }
}

impl RenderBridge for RecordingBridge {
    fn rebuild_graph(&mut self, nodes: &[Node], edges: &[Edge]) {
        self.displayed = nodes
            .iter()
            .map(|node| node.id().clone())
            .chain(edges.iter().map(|edge| edge.id().clone()))
            .collect();
        self.highlighted.clear();
        self.failed.clear();
        self.calls.push(RenderCall::Rebuild {
            nodes: nodes.iter().map(|node| node.id().clone()).collect(),
            edges: edges.iter().map(|edge| edge.id().clone()).collect(),
        });
    }

    fn set_highlight(&mut self, id: &ElementId, on: bool) {
        self.calls.push(RenderCall::Highlight { id: id.clone(), on });
        if !self.displayed.contains(id) {
            return;
        }
        if on {
            self.highlighted.insert(id.clone());
        } else {
            self.highlighted.remove(id);
        }
        self.max_highlighted = self.max_highlighted.max(self.highlighted.len());
    }

    fn set_visit_color(&mut self, id: &ElementId, count: u32) {
        self.calls.push(RenderCall::VisitColor { id: id.clone(), count });
    }

    fn set_failed(&mut self, id: &ElementId) {
        self.calls.push(RenderCall::Failed { id: id.clone() });
        if self.displayed.contains(id) {
            self.failed.insert(id.clone());
        }
    }

    fn refresh_viewport(&mut self) {
        self.calls.push(RenderCall::RefreshViewport);
    }
}
