// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Coverage figures for a run.
//!
//! Figures come either from the aggregate block of an `end` message or, when that block is
//! missing or empty, from the session's own graph and visit counts. Edge and vertex percentages
//! always go through [`percentage`].

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::graph::Graph;
use super::ids::ElementId;
use super::session::RunStatus;

/// The `statistics` object of an inbound `end` message. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawStatistics {
    pub total_number_of_models: Option<u64>,
    pub total_completed_number_of_models: Option<u64>,
    pub total_failed_number_of_models: Option<u64>,
    pub edge_coverage: Option<f64>,
    pub total_number_of_visited_edges: Option<u64>,
    pub total_number_of_unvisited_edges: Option<u64>,
    pub vertex_coverage: Option<f64>,
    pub total_number_of_visited_vertices: Option<u64>,
    pub total_number_of_unvisited_vertices: Option<u64>,
}

impl RawStatistics {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsSource {
    Reported,
    Derived,
}

/// Flat coverage record handed to the presentation layer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub source: StatisticsSource,
    #[serde(rename = "totalNumberOfModels")]
    pub total_models: u64,
    #[serde(rename = "totalCompletedNumberOfModels")]
    pub completed_models: u64,
    #[serde(rename = "totalFailedNumberOfModels")]
    pub failed_models: u64,
    pub edge_coverage: u32,
    #[serde(rename = "totalNumberOfVisitedEdges")]
    pub visited_edges: u64,
    #[serde(rename = "totalNumberOfUnvisitedEdges")]
    pub unvisited_edges: u64,
    pub vertex_coverage: u32,
    #[serde(rename = "totalNumberOfVisitedVertices")]
    pub visited_vertices: u64,
    #[serde(rename = "totalNumberOfUnvisitedVertices")]
    pub unvisited_vertices: u64,
}

impl Statistics {
    pub fn total_edges(&self) -> u64 {
        self.visited_edges.saturating_add(self.unvisited_edges)
    }

    pub fn total_vertices(&self) -> u64 {
        self.visited_vertices.saturating_add(self.unvisited_vertices)
    }
}

/// `round(visited / total * 100)`, or 0 when `total` is 0. Halves round up.
pub fn percentage(visited: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let visited = u128::from(visited.min(total));
    let total = u128::from(total);
    ((visited * 200 + total) / (total * 2)) as u32
}

fn reported_percentage(value: Option<f64>) -> u32 {
    match value {
        Some(value) if value.is_finite() => value.round().clamp(0.0, 100.0) as u32,
        _ => 0,
    }
}

/// Per-category figures: counts win over a reported percentage, so both categories share one
/// rounding rule whenever counts are available.
fn category(visited: Option<u64>, unvisited: Option<u64>, reported: Option<f64>) -> (u32, u64, u64) {
    if visited.is_none() && unvisited.is_none() {
        return (reported_percentage(reported), 0, 0);
    }
    let visited = visited.unwrap_or(0);
    let unvisited = unvisited.unwrap_or(0);
    (percentage(visited, visited.saturating_add(unvisited)), visited, unvisited)
}

pub fn from_reported(raw: &RawStatistics) -> Statistics {
    let (edge_coverage, visited_edges, unvisited_edges) = category(
        raw.total_number_of_visited_edges,
        raw.total_number_of_unvisited_edges,
        raw.edge_coverage,
    );
    let (vertex_coverage, visited_vertices, unvisited_vertices) = category(
        raw.total_number_of_visited_vertices,
        raw.total_number_of_unvisited_vertices,
        raw.vertex_coverage,
    );

    Statistics {
        source: StatisticsSource::Reported,
        total_models: raw.total_number_of_models.unwrap_or(0),
        completed_models: raw.total_completed_number_of_models.unwrap_or(0),
        failed_models: raw.total_failed_number_of_models.unwrap_or(0),
        edge_coverage,
        visited_edges,
        unvisited_edges,
        vertex_coverage,
        visited_vertices,
        unvisited_vertices,
    }
}

pub fn from_session(
    graph: &Graph,
    visit_counts: &HashMap<ElementId, u32>,
    failed: Option<&ElementId>,
    status: RunStatus,
) -> Statistics {
    let visited = |id: &ElementId| visit_counts.get(id).is_some_and(|count| *count > 0);

    let visited_edges = graph.edges().iter().filter(|edge| visited(edge.id())).count() as u64;
    let visited_vertices = graph.nodes().iter().filter(|node| visited(node.id())).count() as u64;
    let total_edges = graph.edges().len() as u64;
    let total_vertices = graph.nodes().len() as u64;

    let models = graph
        .nodes()
        .iter()
        .map(|node| node.model_name())
        .chain(graph.edges().iter().map(|edge| edge.model_name()))
        .collect::<BTreeSet<_>>();
    let total_models = models.len() as u64;

    let failed_models = match failed.and_then(|id| graph.model_name_of(id.as_str())) {
        Some(_) => 1,
        None if status == RunStatus::Failed => total_models.min(1),
        None => 0,
    };

    Statistics {
        source: StatisticsSource::Derived,
        total_models,
        completed_models: total_models.saturating_sub(failed_models),
        failed_models,
        edge_coverage: percentage(visited_edges, total_edges),
        visited_edges,
        unvisited_edges: total_edges - visited_edges,
        vertex_coverage: percentage(visited_vertices, total_vertices),
        visited_vertices,
        unvisited_vertices: total_vertices - visited_vertices,
    }
}

/// Reported figures when the `end` message carries any, session-derived figures otherwise.
pub fn compute_statistics(
    raw: Option<&RawStatistics>,
    graph: &Graph,
    visit_counts: &HashMap<ElementId, u32>,
    failed: Option<&ElementId>,
    status: RunStatus,
) -> Statistics {
    match raw.filter(|raw| !raw.is_empty()) {
        Some(raw) => from_reported(raw),
        None => from_session(graph, visit_counts, failed, status),
    }
}
