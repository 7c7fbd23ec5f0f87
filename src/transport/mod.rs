// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Viewer side of the relay connection.
//!
//! A background thread owns the websocket, decodes inbound frames and hands them to the UI thread
//! over a channel. The thread reconnects with a fixed delay until the connection handle is
//! dropped; the session on the receiving side is never touched by a reconnect.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tungstenite::client::IntoClientRequest;
use tungstenite::handshake::client::Request;
use tungstenite::{Error as WsError, Message, WebSocket};

use crate::protocol::{decode_inbound, encode_outbound, ClientRole, Inbound, Outbound, ProtocolError};

/// What the connection thread reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    Message(Inbound),
    Closed { reason: Option<String> },
    Failed { error: String },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid relay url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported url scheme `{0}` (expected ws://)")]
    UnsupportedScheme(String),
    #[error("could not resolve `{0}`")]
    Unresolved(String),
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("websocket handshake failed: {0}")]
    Handshake(String),
    #[error(transparent)]
    WebSocket(#[from] WsError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: String,
    /// Pause between a lost connection and the next attempt.
    pub reconnect_delay: Duration,
    /// Upper bound on how long the thread blocks before checking for shutdown.
    pub poll_interval: Duration,
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:5555/".to_owned(),
            reconnect_delay: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

/// A validated `ws://` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        let request = url.into_client_request().map_err(|err| TransportError::InvalidUrl {
            url: url.to_owned(),
            reason: err.to_string(),
        })?;
        let uri = request.uri();
        match uri.scheme_str() {
            Some("ws") => {}
            Some(other) => return Err(TransportError::UnsupportedScheme(other.to_owned())),
            None => {
                return Err(TransportError::InvalidUrl {
                    url: url.to_owned(),
                    reason: "missing scheme".to_owned(),
                })
            }
        }
        let host = uri
            .host()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| TransportError::InvalidUrl {
                url: url.to_owned(),
                reason: "missing host".to_owned(),
            })?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_owned();
        Ok(Self {
            url: url.to_owned(),
            port: uri.port_u16().unwrap_or(80),
            host,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn request(&self) -> Result<Request, TransportError> {
        Ok(self.url.as_str().into_client_request()?)
    }
}

/// Frames the viewer sends right after every successful handshake.
pub fn handshake_frames() -> Result<[String; 2], ProtocolError> {
    Ok([
        encode_outbound(&Outbound::Init {
            client: ClientRole::Viewer,
        })?,
        encode_outbound(&Outbound::Start)?,
    ])
}

/// Handle to the background connection thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct ViewerConnection {
    events: Receiver<TransportEvent>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ViewerConnection {
    pub fn spawn(config: TransportConfig) -> Result<Self, TransportError> {
        let endpoint = Endpoint::parse(&config.url)?;
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let worker = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("walkview-transport".to_owned())
                .spawn(move || run_connection_loop(&endpoint, &config, &tx, &stop))?
        };
        Ok(Self {
            events: rx,
            stop,
            worker: Some(worker),
        })
    }

    /// Everything received since the last call, without blocking.
    pub fn drain(&self) -> Vec<TransportEvent> {
        self.events.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<TransportEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn stop_worker(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("transport thread panicked");
            }
        }
    }
}

impl Drop for ViewerConnection {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn run_connection_loop(
    endpoint: &Endpoint,
    config: &TransportConfig,
    events: &Sender<TransportEvent>,
    stop: &AtomicBool,
) {
    let mut attempt: u64 = 0;
    while !stop.load(Ordering::SeqCst) {
        attempt += 1;
        tracing::debug!(url = endpoint.url(), attempt, "connecting to relay");
        let event = match open_socket(endpoint, config) {
            Ok(mut socket) => {
                tracing::info!(url = endpoint.url(), "connected to relay");
                if events.send(TransportEvent::Opened).is_err() {
                    return;
                }
                let reason = pump(&mut socket, events, stop);
                tracing::info!(url = endpoint.url(), reason = ?reason, "relay connection closed");
                TransportEvent::Closed { reason }
            }
            Err(err) => {
                tracing::warn!(url = endpoint.url(), error = %err, "relay connection failed");
                TransportEvent::Failed {
                    error: err.to_string(),
                }
            }
        };
        if events.send(event).is_err() {
            return;
        }
        sleep_unless_stopped(config.reconnect_delay, config.poll_interval, stop);
    }
}

fn open_socket(
    endpoint: &Endpoint,
    config: &TransportConfig,
) -> Result<WebSocket<TcpStream>, TransportError> {
    let addr = (endpoint.host(), endpoint.port())
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| TransportError::Unresolved(endpoint.host().to_owned()))?;
    let stream = TcpStream::connect_timeout(&addr, config.connect_timeout)
        .map_err(|source| TransportError::Connect { addr, source })?;
    stream.set_nodelay(true)?;

    let (mut socket, _response) = tungstenite::client(endpoint.request()?, stream)
        .map_err(|err| TransportError::Handshake(err.to_string()))?;
    // Only set after the handshake: a timeout during the handshake would surface as an
    // interrupted handshake instead of an error.
    socket.get_ref().set_read_timeout(Some(config.poll_interval))?;

    for frame in handshake_frames()? {
        socket.send(Message::text(frame))?;
    }
    Ok(socket)
}

/// Reads until the peer goes away or `stop` is raised. Returns the close reason, if any.
fn pump(
    socket: &mut WebSocket<TcpStream>,
    events: &Sender<TransportEvent>,
    stop: &AtomicBool,
) -> Option<String> {
    loop {
        if stop.load(Ordering::SeqCst) {
            let _ = socket.close(None);
            let _ = socket.flush();
            return Some("viewer shutting down".to_owned());
        }
        match socket.read() {
            Ok(Message::Text(text)) => match decode_inbound(text.as_str()) {
                Ok(message) => {
                    if events.send(TransportEvent::Message(message)).is_err() {
                        let _ = socket.close(None);
                        return None;
                    }
                }
                Err(err) => tracing::warn!(error = %err, "dropping malformed message"),
            },
            Ok(Message::Close(frame)) => {
                return frame
                    .map(|frame| frame.reason.as_str().to_owned())
                    .filter(|reason| !reason.is_empty());
            }
            Ok(_) => {}
            Err(WsError::Io(err))
                if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
            Err(err) => return Some(err.to_string()),
        }
    }
}

fn sleep_unless_stopped(total: Duration, slice: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + total;
    while !stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep(slice.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use tungstenite::protocol::frame::coding::CloseCode;
    use tungstenite::protocol::CloseFrame;

    use super::*;

    #[test]
    fn endpoint_defaults_port_and_keeps_url() {
        let endpoint = Endpoint::parse("ws://relay.local/").expect("endpoint");
        assert_eq!(endpoint.host(), "relay.local");
        assert_eq!(endpoint.port(), 80);
        assert_eq!(endpoint.url(), "ws://relay.local/");

        let endpoint = Endpoint::parse("ws://localhost:5555/").expect("endpoint");
        assert_eq!(endpoint.port(), 5555);
    }

    #[test]
    fn endpoint_rejects_other_schemes() {
        assert!(matches!(
            Endpoint::parse("http://localhost:5555/"),
            Err(TransportError::UnsupportedScheme(scheme)) if scheme == "http"
        ));
        assert!(matches!(
            Endpoint::parse("wss://localhost/"),
            Err(TransportError::UnsupportedScheme(_))
        ));
        assert!(Endpoint::parse("not a url").is_err());
    }

    #[test]
    fn handshake_announces_viewer_then_requests_start() {
        let [init, start] = handshake_frames().expect("frames");
        assert_eq!(init, r#"{"type":"init","client":"viewer"}"#);
        assert_eq!(start, r#"{"type":"start"}"#);
    }

    fn config_for(addr: SocketAddr) -> TransportConfig {
        TransportConfig {
            url: format!("ws://{addr}/"),
            reconnect_delay: Duration::from_millis(50),
            poll_interval: Duration::from_millis(20),
            connect_timeout: Duration::from_secs(1),
        }
    }

    fn next_event(connection: &ViewerConnection) -> TransportEvent {
        connection
            .recv_timeout(Duration::from_secs(5))
            .expect("transport event")
    }

    #[test]
    fn connection_delivers_messages_and_reconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");

        let server = thread::spawn(move || {
            let mut handshakes = Vec::new();
            for round in 0..2 {
                let (stream, _) = listener.accept().expect("accept");
                let mut socket = tungstenite::accept(stream).expect("ws accept");
                let mut frames = Vec::new();
                for _ in 0..2 {
                    let message = socket.read().expect("client frame");
                    frames.push(message.into_text().expect("text").as_str().to_owned());
                }
                handshakes.push(frames);
                if round == 0 {
                    socket
                        .send(Message::text(r#"{"type":"step-start","step":{"id":"v1"}}"#))
                        .expect("send");
                    socket.send(Message::text("{not json")).expect("send");
                    socket
                        .close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "run over".into(),
                        }))
                        .expect("close");
                    while socket.read().is_ok() {}
                }
            }
            handshakes
        });

        let connection = ViewerConnection::spawn(config_for(addr)).expect("spawn");
        assert_eq!(next_event(&connection), TransportEvent::Opened);
        let TransportEvent::Message(Inbound::StepStart { step }) = next_event(&connection) else {
            panic!("expected step-start");
        };
        assert_eq!(step.id.as_deref(), Some("v1"));
        assert_eq!(
            next_event(&connection),
            TransportEvent::Closed {
                reason: Some("run over".to_owned())
            }
        );
        assert_eq!(next_event(&connection), TransportEvent::Opened);
        connection.shutdown();

        let handshakes = server.join().expect("server thread");
        assert_eq!(handshakes.len(), 2);
        for frames in handshakes {
            assert_eq!(
                frames,
                vec![
                    r#"{"type":"init","client":"viewer"}"#.to_owned(),
                    r#"{"type":"start"}"#.to_owned()
                ]
            );
        }
    }

    #[test]
    fn unreachable_relay_reports_failure_and_keeps_trying() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let connection = ViewerConnection::spawn(config_for(addr)).expect("spawn");
        assert!(matches!(next_event(&connection), TransportEvent::Failed { .. }));
        assert!(matches!(next_event(&connection), TransportEvent::Failed { .. }));
        assert!(!connection.is_finished());
    }
}
