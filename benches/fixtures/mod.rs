// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Synthetic walk transcripts: a ring of vertices per sub-model with a chord every third vertex,
//! walked edge by edge.

use serde_json::{json, Value};
use walkview::protocol::{decode_inbound, Inbound};

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Small,
    Medium,
    Large,
}

impl Case {
    pub fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// `(sub-models, vertices per sub-model, steps)`.
    fn shape(self) -> (usize, usize, usize) {
        match self {
            Self::Small => (1, 8, 200),
            Self::Medium => (4, 40, 5_000),
            Self::Large => (12, 120, 50_000),
        }
    }
}

pub struct Transcript {
    pub start: Inbound,
    pub steps: Vec<Inbound>,
    pub end: Inbound,
}

fn sub_model(model: usize, vertices: usize) -> Value {
    let vertex = |idx: usize| {
        json!({ "id": format!("m{model}v{idx}"), "name": format!("v_{model}_{idx}") })
    };
    let mut edges = Vec::new();
    for idx in 0..vertices {
        let next = (idx + 1) % vertices;
        edges.push(json!({
            "id": format!("m{model}e{idx}"),
            "name": format!("e_{model}_{idx}"),
            "sourceVertexId": format!("m{model}v{idx}"),
            "targetVertexId": format!("m{model}v{next}"),
        }));
        if idx % 3 == 0 {
            let chord = (idx + vertices / 2) % vertices;
            edges.push(json!({
                "id": format!("m{model}c{idx}"),
                "name": format!("c_{model}_{idx}"),
                "sourceVertexId": format!("m{model}v{idx}"),
                "targetVertexId": format!("m{model}v{chord}"),
            }));
        }
    }
    json!({
        "name": format!("Model{model}"),
        "vertices": (0..vertices).map(vertex).collect::<Vec<_>>(),
        "edges": edges,
    })
}

fn decode(value: Value) -> Inbound {
    decode_inbound(&value.to_string()).expect("fixture message")
}

pub fn fixture(case: Case) -> Transcript {
    let (models, vertices, steps) = case.shape();
    let start = decode(json!({
        "type": "start",
        "models": [{ "models": (0..models).map(|m| sub_model(m, vertices)).collect::<Vec<_>>() }],
    }));

    let steps = (0..steps)
        .map(|step| {
            let model = (step / (2 * vertices)) % models;
            let idx = (step / 2) % vertices;
            let (id, name) = if step % 2 == 0 {
                (format!("m{model}v{idx}"), format!("v_{model}_{idx}"))
            } else {
                (format!("m{model}e{idx}"), format!("e_{model}_{idx}"))
            };
            // Every fifth step references the element by name instead of raw id.
            let step_ref = if step % 5 == 0 {
                json!({ "name": name })
            } else {
                json!({ "id": id })
            };
            decode(json!({ "type": "step-start", "step": step_ref }))
        })
        .collect();

    let end = decode(json!({ "type": "end", "status": true }));
    Transcript { start, steps, end }
}
