// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Event router: the run-lifecycle state machine.
//!
//! Inbound messages are applied strictly in arrival order; each call to [`EventRouter::handle`]
//! finishes its session mutation and repaint before returning. Nothing here returns an error: an
//! update that cannot be applied is logged and skipped.

use std::fmt;

use crate::model::{RawModelContainer, RawStatistics, RunStatus, Session};
use crate::protocol::{Inbound, StepRef, StepResult};
use crate::render::RenderBridge;
use crate::transport::TransportEvent;

mod sink;

pub use sink::{BufferedSink, ConsoleSink, OutputSink, SinkEntry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RunPhase {
    #[default]
    Idle,
    AwaitingRun,
    Running,
    Ended,
}

impl RunPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingRun => "awaiting run",
            Self::Running => "running",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the session and is its only writer.
#[derive(Debug)]
pub struct EventRouter<B, S> {
    session: Session,
    phase: RunPhase,
    connected: bool,
    bridge: B,
    sink: S,
}

impl<B: RenderBridge, S: OutputSink> EventRouter<B, S> {
    pub fn new(bridge: B, sink: S) -> Self {
        Self {
            session: Session::new(),
            phase: RunPhase::Idle,
            connected: false,
            bridge,
            sink,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_parts(self) -> (Session, B, S) {
        (self.session, self.bridge, self.sink)
    }

    /// Applies one transport event.
    pub fn dispatch(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => self.on_connected(),
            TransportEvent::Message(message) => self.handle(message),
            TransportEvent::Closed { reason } => {
                tracing::info!(reason = ?reason, "viewer connection closed");
                self.connected = false;
            }
            TransportEvent::Failed { error } => {
                tracing::warn!(%error, "viewer connection failed");
                self.connected = false;
            }
        }
    }

    pub fn on_connected(&mut self) {
        self.connected = true;
        if matches!(self.phase, RunPhase::Idle | RunPhase::Ended) {
            self.phase = RunPhase::AwaitingRun;
        }
    }

    pub fn handle(&mut self, message: Inbound) {
        match message {
            Inbound::Start { models } => self.on_run_start(&models),
            Inbound::StepStart { step } => self.on_step_start(&step),
            Inbound::StepEnd { result } => self.on_step_end(&result),
            Inbound::End { status, statistics } => {
                self.on_run_end(RunStatus::from_passed(status), statistics.as_ref())
            }
            Inbound::Error {
                message,
                trace,
                step,
            } => self.on_error(&message, trace.as_deref(), step.as_ref()),
            Inbound::Unknown { kind } => {
                tracing::info!(%kind, "ignoring unrecognized message kind");
            }
        }
    }

    /// Operator reset: forget the run and blank the surface.
    pub fn clear(&mut self) {
        self.session.clear();
        self.bridge.rebuild_graph(&[], &[]);
        self.bridge.refresh_viewport();
        self.phase = if self.connected {
            RunPhase::AwaitingRun
        } else {
            RunPhase::Idle
        };
    }

    fn on_run_start(&mut self, models: &[RawModelContainer]) {
        self.session.start_run(models);
        let graph = self.session.graph();
        tracing::info!(
            previous_phase = %self.phase,
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            "run started"
        );
        self.bridge.rebuild_graph(graph.nodes(), graph.edges());
        self.bridge.refresh_viewport();
        self.phase = RunPhase::Running;
    }

    fn on_step_start(&mut self, step: &StepRef) {
        if !matches!(self.phase, RunPhase::Running | RunPhase::AwaitingRun) {
            tracing::debug!(phase = %self.phase, step = step.display_name(), "ignoring step-start");
            return;
        }
        self.phase = RunPhase::Running;

        let Some(candidate) = step
            .candidates()
            .find(|candidate| self.session.resolve(candidate).is_some())
        else {
            tracing::debug!(step = step.display_name(), "step-start references no known element");
            return;
        };

        let outcome = self.session.visit(candidate);
        let Some(resolved) = outcome.resolved_id else {
            return;
        };
        if let Some(previous) = &outcome.previous_current_id {
            self.bridge.set_highlight(previous, false);
        }
        self.bridge.set_visit_color(&resolved, outcome.count);
        self.bridge.set_highlight(&resolved, true);
    }

    fn on_step_end(&mut self, result: &StepResult) {
        if self.phase != RunPhase::Running {
            tracing::debug!(phase = %self.phase, "ignoring step-end");
            return;
        }

        if let Some(output) = result.output.as_deref().filter(|text| !text.trim().is_empty()) {
            self.sink.step_output(output);
        }

        let Some(error) = &result.error else {
            return;
        };
        // A result without an id belongs to the step that is currently executing.
        let target = result
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| self.session.current_element_id().map(|id| id.as_str().to_owned()));
        if let Some(target) = target {
            self.fail_element(&target);
        }
        self.sink.error(&error.message, error.trace.as_deref());
    }

    fn on_run_end(&mut self, status: RunStatus, statistics: Option<&RawStatistics>) {
        if self.phase != RunPhase::Running {
            tracing::debug!(phase = %self.phase, "ignoring end");
            return;
        }

        let statistics = self.session.end_run(status, statistics).clone();
        if let Some(current) = self.session.current_element_id() {
            self.bridge.set_highlight(current, false);
        }
        tracing::info!(
            %status,
            edge_coverage = statistics.edge_coverage,
            vertex_coverage = statistics.vertex_coverage,
            "run ended"
        );
        self.sink.run_finished(status, &statistics);
        self.phase = RunPhase::Ended;
    }

    fn on_error(&mut self, message: &str, trace: Option<&str>, step: Option<&StepRef>) {
        if let Some(step) = step {
            let candidate = step
                .candidates()
                .find(|candidate| self.session.resolve(candidate).is_some())
                .map(str::to_owned);
            match candidate {
                Some(candidate) => self.fail_element(&candidate),
                None => tracing::debug!(step = step.display_name(), "error references no known element"),
            }
        }
        self.sink.error(message, trace);
    }

    fn fail_element(&mut self, raw_id: &str) {
        let outcome = self.session.mark_failed(raw_id);
        match outcome.resolved_id {
            Some(resolved) => self.bridge.set_failed(&resolved),
            None => tracing::debug!(raw_id, "failure references no known element"),
        }
    }
}
