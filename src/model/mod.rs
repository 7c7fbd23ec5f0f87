// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: canonical graph, identifier resolution, session state and coverage.
//!
//! Nothing in here suspends or fails; every operation is total over in-memory state.

pub mod adapter;
pub mod coverage;
pub mod graph;
pub mod ids;
pub mod resolve;
pub mod session;

pub use adapter::{
    normalize, NormalizedModel, RawEdge, RawModelContainer, RawSubModel, RawVertex,
};
pub use coverage::{
    compute_statistics, percentage, RawStatistics, Statistics, StatisticsSource,
};
pub use graph::{Edge, ElementKind, Graph, Node};
pub use ids::{ElementId, Id, IdError};
pub use resolve::Resolver;
pub use session::{FailOutcome, RunStatus, Session, VisitOutcome};
