// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Headless render bridge: every visual effect becomes a structured log event.

use super::{RenderBridge, VisitColorScale};
use crate::model::{Edge, ElementId, Node};

#[derive(Debug, Clone, Default)]
pub struct LogBridge {
    scale: VisitColorScale,
}

impl LogBridge {
    pub fn new(scale: VisitColorScale) -> Self {
        Self { scale }
    }
}

impl RenderBridge for LogBridge {
    fn rebuild_graph(&mut self, nodes: &[Node], edges: &[Edge]) {
        tracing::info!(nodes = nodes.len(), edges = edges.len(), "render: rebuild graph");
    }

    fn set_highlight(&mut self, id: &ElementId, on: bool) {
        tracing::debug!(%id, on, "render: highlight");
    }

    fn set_visit_color(&mut self, id: &ElementId, count: u32) {
        tracing::info!(%id, count, color = %self.scale.color_for(count), "render: visit");
    }

    fn set_failed(&mut self, id: &ElementId) {
        tracing::warn!(%id, "render: failed");
    }

    fn refresh_viewport(&mut self) {
        tracing::debug!("render: refresh viewport");
    }
}
