// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Replays recorded reporter transcripts (one JSON message per line) through the router.

use std::fs;
use std::path::{Path, PathBuf};

use walkview::model::{ElementId, RunStatus, StatisticsSource};
use walkview::protocol::decode_inbound;
use walkview::render::{RecordingBridge, RenderCall};
use walkview::router::{BufferedSink, EventRouter, RunPhase, SinkEntry};
use walkview::transport::TransportEvent;

type Router = EventRouter<RecordingBridge, BufferedSink>;

fn transcript_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("transcripts")
        .join(name)
}

/// Decodes each line the way the transport does: undecodable lines are dropped.
fn transcript(name: &str) -> Vec<TransportEvent> {
    let path = transcript_path(name);
    let text = fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read {path:?}: {err}"));
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| decode_inbound(line).ok())
        .map(TransportEvent::Message)
        .collect()
}

fn replay(events: impl IntoIterator<Item = TransportEvent>) -> Router {
    let mut router = EventRouter::new(RecordingBridge::new(), BufferedSink::default());
    router.dispatch(TransportEvent::Opened);
    for event in events {
        router.dispatch(event);
    }
    router
}

fn id(value: &str) -> ElementId {
    ElementId::new(value).expect("element id")
}

#[test]
fn worked_example_transcript() {
    let router = replay(transcript("worked_example.jsonl"));
    let session = router.session();

    assert_eq!(router.phase(), RunPhase::Ended);
    assert_eq!(session.visit_count("A"), 2);
    assert_eq!(session.visit_count("B"), 0);
    assert_eq!(session.current_element_id(), Some(&id("A")));
    assert_eq!(session.failed_element_id(), Some(&id("B")));
    assert_eq!(session.status(), RunStatus::Failed);

    let statistics = session.statistics().expect("statistics");
    assert_eq!(statistics.source, StatisticsSource::Reported);
    assert_eq!(statistics.edge_coverage, 50);
    assert_eq!(statistics.vertex_coverage, 100);

    assert_eq!(
        router.bridge().calls(),
        &[
            RenderCall::Rebuild {
                nodes: vec![id("A"), id("B")],
                edges: vec![id("go")],
            },
            RenderCall::RefreshViewport,
            RenderCall::VisitColor { id: id("A"), count: 1 },
            RenderCall::Highlight { id: id("A"), on: true },
            RenderCall::Highlight { id: id("A"), on: false },
            RenderCall::VisitColor { id: id("A"), count: 2 },
            RenderCall::Highlight { id: id("A"), on: true },
            RenderCall::Failed { id: id("B") },
            RenderCall::Highlight { id: id("A"), on: false },
        ]
    );
    assert!(router.bridge().highlighted().is_empty());

    let entries = router.sink().entries().cloned().collect::<Vec<_>>();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0], SinkEntry::Output("[10:00:00] Example.A:\nopened".to_owned()));
    assert_eq!(
        entries[1],
        SinkEntry::Error {
            message: "B did not load".to_owned(),
            trace: Some("Traceback:\n  step B".to_owned()),
        }
    );
    assert!(matches!(
        &entries[2],
        SinkEntry::Finished { status: RunStatus::Failed, .. }
    ));
}

#[test]
fn noisy_transcript_degrades_gracefully() {
    let router = replay(transcript("noisy_shop.jsonl"));
    let session = router.session();

    let nodes = session
        .graph()
        .nodes()
        .iter()
        .map(|node| node.id().as_str())
        .collect::<Vec<_>>();
    assert_eq!(nodes, vec!["v_home", "v_cart", "v_checkout", "v_form"]);
    let edges = session
        .graph()
        .edges()
        .iter()
        .map(|edge| edge.id().as_str())
        .collect::<Vec<_>>();
    assert_eq!(edges, vec!["e_add", "e_pay", "e_back"]);

    assert_eq!(session.visit_count("v_home"), 2);
    assert_eq!(session.visit_count("e_pay"), 1);
    assert_eq!(session.visit_counts().values().sum::<u32>(), 7);
    assert_eq!(session.failed_element_id(), None);
    assert_eq!(router.bridge().max_highlighted(), 1);

    let statistics = session.statistics().expect("statistics");
    assert_eq!(statistics.source, StatisticsSource::Derived);
    assert_eq!(statistics.total_models, 2);
    assert_eq!(statistics.completed_models, 2);
    assert_eq!(statistics.failed_models, 0);
    assert_eq!(statistics.edge_coverage, 100);
    assert_eq!(statistics.vertex_coverage, 75);
    assert_eq!(statistics.unvisited_vertices, 1);
    assert_eq!(session.status(), RunStatus::Passed);

    assert!(router
        .sink()
        .entries()
        .any(|entry| matches!(entry, SinkEntry::Error { message, .. } if message == "executor warning")));
}

#[test]
fn second_run_replaces_the_first() {
    let router = replay(transcript("rerun.jsonl"));
    let session = router.session();

    assert_eq!(router.phase(), RunPhase::Ended);
    assert_eq!(session.visit_counts().len(), 1);
    assert_eq!(session.visit_count("v_b"), 1);
    assert_eq!(session.failed_element_id(), None);
    assert_eq!(session.status(), RunStatus::Passed);
    assert!(router.bridge().failed().is_empty());

    let statistics = session.statistics().expect("statistics");
    assert_eq!(statistics.source, StatisticsSource::Derived);
    assert_eq!(statistics.vertex_coverage, 100);
    assert_eq!(statistics.edge_coverage, 0);

    let finished = router
        .sink()
        .entries()
        .filter_map(|entry| match entry {
            SinkEntry::Finished { status, statistics } => Some((*status, statistics.failed_models)),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(finished, vec![(RunStatus::Failed, 1), (RunStatus::Passed, 0)]);
}

#[test]
fn reconnecting_mid_run_keeps_the_session() {
    let events = transcript("worked_example.jsonl");
    let (head, tail) = events.split_at(3);

    let mut interrupted = head.to_vec();
    interrupted.push(TransportEvent::Closed {
        reason: Some("relay restarted".to_owned()),
    });
    interrupted.push(TransportEvent::Failed {
        error: "connection refused".to_owned(),
    });
    interrupted.push(TransportEvent::Opened);
    interrupted.extend(tail.iter().cloned());

    let straight = replay(events.clone());
    let resumed = replay(interrupted);
    assert_eq!(resumed.session(), straight.session());
    assert_eq!(resumed.bridge().calls(), straight.bridge().calls());
    assert!(resumed.is_connected());
}
