// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Normalization of run-start model payloads into one canonical graph.
//!
//! Producers send either wrapper objects carrying a `models` list or bare models; both shapes go
//! through the same per-model pass. A vertex or edge is keyed by its display name when it has
//! one and by its raw id otherwise. Every alias seen is recorded in a [`Resolver`] because later
//! step events may reference an element by either form.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use super::graph::{Edge, Graph, Node};
use super::ids::ElementId;
use super::resolve::Resolver;

/// One entry of the `models` array of an inbound `start` message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawModelContainer {
    pub name: Option<String>,
    pub models: Option<Vec<RawSubModel>>,
    pub vertices: Option<Vec<RawVertex>>,
    pub edges: Option<Vec<RawEdge>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawSubModel {
    pub name: Option<String>,
    pub vertices: Option<Vec<RawVertex>>,
    pub edges: Option<Vec<RawEdge>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawVertex {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    pub properties: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEdge {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub source_vertex_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub target_vertex_id: Option<String>,
}

/// Accepts strings and numbers; anything else (including `null`) becomes `None`.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// Result of [`normalize`]: the canonical graph plus the alias table built alongside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedModel {
    pub graph: Graph,
    pub resolver: Resolver,
}

impl NormalizedModel {
    pub fn resolve(&self, any_id: &str) -> Option<&ElementId> {
        self.resolver.resolve(any_id)
    }
}

struct SubModelView<'a> {
    name: &'a str,
    vertices: &'a [RawVertex],
    edges: &'a [RawEdge],
}

/// Normalizes run-start payloads. Never fails; unusable entries are skipped with a warning.
pub fn normalize(raw_models: &[RawModelContainer]) -> NormalizedModel {
    let mut out = NormalizedModel::default();

    for container in raw_models {
        let container_name = container.name.as_deref().unwrap_or_default();
        match &container.models {
            Some(models) => {
                for sub in models {
                    normalize_sub_model(
                        &mut out,
                        SubModelView {
                            name: sub.name.as_deref().unwrap_or(container_name),
                            vertices: sub.vertices.as_deref().unwrap_or_default(),
                            edges: sub.edges.as_deref().unwrap_or_default(),
                        },
                    );
                }
            }
            None => normalize_sub_model(
                &mut out,
                SubModelView {
                    name: container_name,
                    vertices: container.vertices.as_deref().unwrap_or_default(),
                    edges: container.edges.as_deref().unwrap_or_default(),
                },
            ),
        }
    }

    out
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// Name first, raw id second. A candidate that is already an element id or an alias of another
/// element is passed over, so every canonical id resolves to its own element.
fn pick_canonical(
    out: &NormalizedModel,
    name: Option<&str>,
    raw_id: Option<&str>,
) -> Option<ElementId> {
    [name, raw_id]
        .into_iter()
        .flatten()
        .filter(|candidate| !out.graph.contains(candidate) && out.resolve(candidate).is_none())
        .find_map(|candidate| ElementId::new(candidate).ok())
}

fn normalize_sub_model(out: &mut NormalizedModel, sub: SubModelView<'_>) {
    // Endpoint lookups are scoped to the vertices of this sub-model.
    let mut by_raw_id = HashMap::<&str, ElementId>::new();
    let mut by_canonical = HashMap::<String, ElementId>::new();

    for vertex in sub.vertices {
        let raw_id = non_empty(&vertex.id);
        let name = non_empty(&vertex.name);
        let Some(canonical) = pick_canonical(out, name, raw_id) else {
            tracing::warn!(
                model = sub.name,
                raw_id = ?raw_id,
                name = ?name,
                "skipping vertex without an unused identifier"
            );
            continue;
        };

        let label = name.or(raw_id).unwrap_or_default();
        let node = Node::new(canonical.clone(), label, sub.name).with_data(vertex.properties.clone());
        out.graph.push_node(node);

        out.resolver.insert(canonical.as_str(), &canonical);
        if let Some(raw_id) = raw_id {
            out.resolver.insert(raw_id, &canonical);
            by_raw_id.entry(raw_id).or_insert_with(|| canonical.clone());
        }
        if let Some(name) = name {
            out.resolver.insert(name, &canonical);
        }
        by_canonical.insert(canonical.as_str().to_owned(), canonical);
    }

    let endpoint = |declared: Option<&str>| -> Option<ElementId> {
        let declared = declared?;
        by_raw_id
            .get(declared)
            .or_else(|| by_canonical.get(declared))
            .cloned()
    };

    for edge in sub.edges {
        let raw_id = non_empty(&edge.id);
        let name = non_empty(&edge.name);
        let source = endpoint(non_empty(&edge.source_vertex_id));
        let target = endpoint(non_empty(&edge.target_vertex_id));

        let (Some(source), Some(target)) = (source, target) else {
            tracing::warn!(
                model = sub.name,
                edge = ?name.or(raw_id),
                source = ?edge.source_vertex_id,
                target = ?edge.target_vertex_id,
                "dropping edge with unresolved endpoints"
            );
            continue;
        };

        let Some(canonical) = pick_canonical(out, name, raw_id) else {
            tracing::warn!(
                model = sub.name,
                raw_id = ?raw_id,
                name = ?name,
                "skipping edge without an unused identifier"
            );
            continue;
        };

        let label = name.or(raw_id).unwrap_or_default();
        out.graph
            .push_edge(Edge::new(canonical.clone(), label, source, target, sub.name));

        out.resolver.insert(canonical.as_str(), &canonical);
        if let Some(raw_id) = raw_id {
            out.resolver.insert(raw_id, &canonical);
        }
        if let Some(name) = name {
            out.resolver.insert(name, &canonical);
        }
    }
}
