// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::fmt;

use super::adapter::{normalize, NormalizedModel, RawModelContainer};
use super::coverage::{compute_statistics, RawStatistics, Statistics};
use super::graph::Graph;
use super::ids::ElementId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RunStatus {
    #[default]
    Unknown,
    Passed,
    Failed,
}

impl RunStatus {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Self::Passed
        } else {
            Self::Failed
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What [`Session::visit`] did, with enough context for the caller to repaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitOutcome {
    pub resolved_id: Option<ElementId>,
    pub is_known: bool,
    pub previous_current_id: Option<ElementId>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailOutcome {
    pub resolved_id: Option<ElementId>,
    pub is_known: bool,
}

/// The mutable record of the current run.
///
/// Every id stored in `visit_counts`, `current` or `failed` resolves to an element of `graph`;
/// references that do not resolve are dropped before they reach any of those fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    model: NormalizedModel,
    visit_counts: HashMap<ElementId, u32>,
    current: Option<ElementId>,
    failed: Option<ElementId>,
    status: RunStatus,
    statistics: Option<Statistics>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &Graph {
        &self.model.graph
    }

    pub fn visit_counts(&self) -> &HashMap<ElementId, u32> {
        &self.visit_counts
    }

    pub fn visit_count(&self, id: &str) -> u32 {
        self.visit_counts.get(id).copied().unwrap_or(0)
    }

    pub fn current_element_id(&self) -> Option<&ElementId> {
        self.current.as_ref()
    }

    pub fn failed_element_id(&self) -> Option<&ElementId> {
        self.failed.as_ref()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn resolve(&self, any_id: &str) -> Option<&ElementId> {
        self.model.resolve(any_id)
    }

    /// Resolves the first candidate reference that names a known element.
    pub fn resolve_first<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a str>,
    ) -> Option<&ElementId> {
        self.model.resolver.resolve_first(candidates)
    }

    /// Replaces the graph wholesale and forgets everything about the previous run.
    pub fn start_run(&mut self, raw_models: &[RawModelContainer]) {
        *self = Self {
            model: normalize(raw_models),
            ..Self::default()
        };
    }

    pub fn visit(&mut self, raw_element_id: &str) -> VisitOutcome {
        let Some(resolved) = self.model.resolve(raw_element_id).cloned() else {
            return VisitOutcome {
                resolved_id: None,
                is_known: false,
                previous_current_id: self.current.clone(),
                count: 0,
            };
        };

        let count = self.visit_counts.entry(resolved.clone()).or_insert(0);
        *count = count.saturating_add(1);
        let count = *count;

        let previous_current_id = self.current.replace(resolved.clone());
        VisitOutcome {
            resolved_id: Some(resolved),
            is_known: true,
            previous_current_id,
            count,
        }
    }

    pub fn mark_failed(&mut self, raw_element_id: &str) -> FailOutcome {
        let Some(resolved) = self.model.resolve(raw_element_id).cloned() else {
            return FailOutcome {
                resolved_id: None,
                is_known: false,
            };
        };

        self.failed = Some(resolved.clone());
        FailOutcome {
            resolved_id: Some(resolved),
            is_known: true,
        }
    }

    /// Fixes the run outcome and its coverage figures.
    pub fn end_run(&mut self, status: RunStatus, raw_statistics: Option<&RawStatistics>) -> &Statistics {
        self.status = status;
        let statistics = compute_statistics(
            raw_statistics,
            &self.model.graph,
            &self.visit_counts,
            self.failed.as_ref(),
            status,
        );
        self.statistics.insert(statistics)
    }

    /// Current-run coverage computed on demand from the session itself.
    pub fn live_statistics(&self) -> Statistics {
        compute_statistics(
            None,
            &self.model.graph,
            &self.visit_counts,
            self.failed.as_ref(),
            self.status,
        )
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
