// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Relay end to end: a raw websocket reporter, the real viewer connection and HTTP health checks.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use walkview::protocol::Inbound;
use walkview::relay::{serve_on, RelayState};
use walkview::transport::{TransportConfig, TransportEvent, ViewerConnection};

type RawSocket = WebSocket<MaybeTlsStream<TcpStream>>;

async fn start_relay() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = serve_on(listener, RelayState::default(), std::future::pending()).await;
    });
    addr
}

fn raw_client(addr: SocketAddr, init: &str) -> RawSocket {
    let (mut socket, _) = tungstenite::connect(format!("ws://{addr}/")).expect("connect");
    if let MaybeTlsStream::Plain(stream) = socket.get_ref() {
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
    }
    socket.send(Message::text(init.to_owned())).expect("send init");
    socket
}

fn read_text(socket: &mut RawSocket) -> String {
    loop {
        match socket.read().expect("read") {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

fn read_close(socket: &mut RawSocket) -> (u16, String) {
    loop {
        match socket.read().expect("read") {
            Message::Close(Some(frame)) => {
                return (u16::from(frame.code), frame.reason.as_str().to_owned());
            }
            Message::Close(None) => panic!("close without frame"),
            _ => continue,
        }
    }
}

fn http_get(addr: SocketAddr, path: &str) -> Value {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
    )
    .expect("write request");
    let mut response = String::new();
    stream.read_to_string(&mut response).expect("read response");
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    let (_, body) = response.split_once("\r\n\r\n").expect("body");
    serde_json::from_str(body).expect("json body")
}

/// Polls `/versionz` until `field` reads `expected`.
fn wait_for_slot(addr: SocketAddr, field: &str, expected: bool) {
    for _ in 0..100 {
        if http_get(addr, "/versionz")[field] == expected {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("{field} never became {expected}");
}

fn next_event(connection: &ViewerConnection) -> TransportEvent {
    connection
        .recv_timeout(Duration::from_secs(5))
        .expect("transport event")
}

#[tokio::test]
async fn health_and_version_endpoints() {
    let addr = start_relay().await;
    tokio::task::spawn_blocking(move || {
        assert_eq!(http_get(addr, "/healthz"), serde_json::json!({ "status": "ok" }));
        let version = http_get(addr, "/versionz");
        assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(version["reporter_connected"], false);
        assert_eq!(version["viewer_connected"], false);
    })
    .await
    .expect("client thread");
}

#[tokio::test]
async fn reporter_run_reaches_viewer() {
    let addr = start_relay().await;
    tokio::task::spawn_blocking(move || {
        let mut reporter = raw_client(addr, r#"{"type":"init","client":"reporter"}"#);
        let start = r#"{"type":"start","models":[{"name":"M","vertices":[{"id":"v1","name":"A"}]}]}"#;
        reporter.send(Message::text(start)).expect("send start");
        wait_for_slot(addr, "reporter_connected", true);

        let viewer = ViewerConnection::spawn(TransportConfig {
            url: format!("ws://{addr}/"),
            reconnect_delay: Duration::from_millis(50),
            poll_interval: Duration::from_millis(20),
            ..TransportConfig::default()
        })
        .expect("viewer");
        assert_eq!(next_event(&viewer), TransportEvent::Opened);
        let TransportEvent::Message(Inbound::Start { models }) = next_event(&viewer) else {
            panic!("expected start");
        };
        assert_eq!(models.len(), 1);

        // Readiness acknowledgement from the relay, then the viewer's own start request.
        assert_eq!(read_text(&mut reporter), r#"{"type":"start"}"#);
        assert_eq!(read_text(&mut reporter), r#"{"type":"start"}"#);

        reporter
            .send(Message::text(r#"{"type":"step-start","step":{"id":"v1"}}"#))
            .expect("send step");
        let TransportEvent::Message(Inbound::StepStart { step }) = next_event(&viewer) else {
            panic!("expected step-start");
        };
        assert_eq!(step.id.as_deref(), Some("v1"));

        let version = http_get(addr, "/versionz");
        assert_eq!(version["reporter_connected"], true);
        assert_eq!(version["viewer_connected"], true);

        let mut second_viewer = raw_client(addr, r#"{"type":"init","client":"viewer"}"#);
        assert_eq!(
            read_close(&mut second_viewer),
            (1008, "Viewer already connected".to_owned())
        );
        let mut second_reporter = raw_client(addr, r#"{"type":"init","client":"reporter"}"#);
        assert_eq!(
            read_close(&mut second_reporter),
            (1008, "Reporter already connected".to_owned())
        );

        viewer.shutdown();
    })
    .await
    .expect("client thread");
}

#[tokio::test]
async fn bad_handshakes_are_closed_with_policy_violation() {
    let addr = start_relay().await;
    tokio::task::spawn_blocking(move || {
        let mut socket = raw_client(addr, r#"{"type":"hello"}"#);
        assert_eq!(read_close(&mut socket), (1008, "Invalid initialization".to_owned()));

        let mut socket = raw_client(addr, "not json");
        assert_eq!(read_close(&mut socket), (1008, "Invalid initialization".to_owned()));

        let mut socket = raw_client(addr, r#"{"type":"init","client":"spy"}"#);
        assert_eq!(read_close(&mut socket), (1008, "Unknown client type".to_owned()));

        let version = http_get(addr, "/versionz");
        assert_eq!(version["reporter_connected"], false);
        assert_eq!(version["viewer_connected"], false);
    })
    .await
    .expect("client thread");
}

#[tokio::test]
async fn disconnect_frees_the_slot() {
    let addr = start_relay().await;
    tokio::task::spawn_blocking(move || {
        let mut first = raw_client(addr, r#"{"type":"init","client":"reporter"}"#);
        wait_for_slot(addr, "reporter_connected", true);
        first.close(None).expect("close");
        let _ = first.read();
        wait_for_slot(addr, "reporter_connected", false);

        let mut second = raw_client(addr, r#"{"type":"init","client":"reporter"}"#);
        wait_for_slot(addr, "reporter_connected", true);

        let mut viewer = raw_client(addr, r#"{"type":"init","client":"viewer"}"#);
        assert_eq!(read_text(&mut second), r#"{"type":"start"}"#);
        viewer.close(None).expect("close viewer");
    })
    .await
    .expect("client thread");
}
