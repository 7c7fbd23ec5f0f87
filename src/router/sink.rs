// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::VecDeque;

use crate::model::{RunStatus, Statistics};

/// Receives the textual side of a run: step output, errors and final figures.
pub trait OutputSink {
    fn step_output(&mut self, text: &str);

    fn error(&mut self, message: &str, trace: Option<&str>);

    fn run_finished(&mut self, status: RunStatus, statistics: &Statistics);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEntry {
    Output(String),
    Error { message: String, trace: Option<String> },
    Finished { status: RunStatus, statistics: Statistics },
}

/// Keeps the most recent entries, dropping the oldest beyond `capacity`.
#[derive(Debug, Clone)]
pub struct BufferedSink {
    entries: VecDeque<SinkEntry>,
    capacity: usize,
}

impl Default for BufferedSink {
    fn default() -> Self {
        Self::with_capacity(500)
    }
}

impl BufferedSink {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &SinkEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn push(&mut self, entry: SinkEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }
}

impl OutputSink for BufferedSink {
    fn step_output(&mut self, text: &str) {
        self.push(SinkEntry::Output(text.to_owned()));
    }

    fn error(&mut self, message: &str, trace: Option<&str>) {
        self.push(SinkEntry::Error {
            message: message.to_owned(),
            trace: trace.map(str::to_owned),
        });
    }

    fn run_finished(&mut self, status: RunStatus, statistics: &Statistics) {
        self.push(SinkEntry::Finished {
            status,
            statistics: statistics.clone(),
        });
    }
}

/// Headless sink: output to stdout, errors to stderr, final figures as one JSON line on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn step_output(&mut self, text: &str) {
        println!("{text}");
    }

    fn error(&mut self, message: &str, trace: Option<&str>) {
        eprintln!("error: {message}");
        if let Some(trace) = trace.filter(|trace| !trace.is_empty()) {
            eprintln!("{trace}");
        }
    }

    fn run_finished(&mut self, status: RunStatus, statistics: &Statistics) {
        let line = serde_json::json!({ "status": status.as_str(), "statistics": statistics });
        println!("{line}");
    }
}
