// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Websocket relay pairing one reporter (the test executor) with one viewer.
//!
//! Every client connects to `/` and identifies itself with an `init` frame before anything else.
//! Reporter frames are forwarded verbatim to the viewer, viewer frames to the reporter.

use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::RelayConfig;
use crate::protocol::{decode_init, ClientRole, ProtocolError};

mod hub;

pub use hub::{ConnectionId, PeerSender, RelayHub};

/// Close code for a peer that broke the handshake rules.
pub const POLICY_VIOLATION: u16 = 1008;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Reporter already connected")]
    ReporterTaken,
    #[error("Viewer already connected")]
    ViewerTaken,
    #[error("cannot bind {host}:{port}: {source}")]
    Bind {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RelayError {
    pub fn already_connected(role: ClientRole) -> Self {
        match role {
            ClientRole::Reporter => Self::ReporterTaken,
            ClientRole::Viewer => Self::ViewerTaken,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelayState {
    hub: Arc<Mutex<RelayHub>>,
}

impl RelayState {
    pub fn hub(&self) -> MutexGuard<'_, RelayHub> {
        self.hub.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Serialize)]
struct VersionInfo {
    version: &'static str,
    reporter_connected: bool,
    viewer_connected: bool,
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(websocket))
        .route("/healthz", get(healthz))
        .route("/versionz", get(versionz))
        .with_state(state)
}

/// Binds `config` and serves until ctrl-c.
pub async fn serve(config: &RelayConfig) -> Result<(), RelayError> {
    let (host, port) = config.bind_target();
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|source| RelayError::Bind {
            host: host.to_owned(),
            port,
            source,
        })?;
    serve_on(listener, RelayState::default(), async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for ctrl-c");
        }
    })
    .await
}

pub async fn serve_on(
    listener: TcpListener,
    state: RelayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), RelayError> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "relay listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("relay stopped");
    Ok(())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn versionz(State(state): State<RelayState>) -> Json<VersionInfo> {
    let (reporter_connected, viewer_connected) = {
        let hub = state.hub();
        (
            hub.is_connected(ClientRole::Reporter),
            hub.is_connected(ClientRole::Viewer),
        )
    };
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        reporter_connected,
        viewer_connected,
    })
}

async fn websocket(ws: WebSocketUpgrade, State(state): State<RelayState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| peer_loop(socket, state))
}

async fn peer_loop(mut socket: WebSocket, state: RelayState) {
    let role = match read_init(&mut socket).await {
        Some(Ok(role)) => role,
        Some(Err(reason)) => {
            tracing::info!(reason, "rejecting peer");
            close(&mut socket, reason).await;
            return;
        }
        None => {
            tracing::info!("peer left before initialization");
            return;
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let registered = state.hub().register(role, tx);
    let id = match registered {
        Ok(id) => id,
        Err(err) => {
            let reason = err.to_string();
            tracing::info!(role = role.as_str(), %reason, "rejecting peer");
            close(&mut socket, &reason).await;
            return;
        }
    };

    loop {
        tokio::select! {
            outgoing = rx.recv() => {
                let Some(text) = outgoing else { break };
                if let Err(err) = socket.send(Message::Text(text.into())).await {
                    tracing::warn!(role = role.as_str(), error = %err, "send failed");
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    state.hub().route(role, text.as_str());
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::warn!(role = role.as_str(), error = %err, "receive failed");
                    break;
                }
            },
        }
    }

    state.hub().unregister(role, id);
}

/// `None` when the peer disconnects first; `Err` carries the close reason.
async fn read_init(socket: &mut WebSocket) -> Option<Result<ClientRole, &'static str>> {
    loop {
        let message = match socket.recv().await? {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(error = %err, "receive failed during initialization");
                return None;
            }
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => return None,
            Message::Binary(_) => return Some(Err("Invalid initialization")),
        };
        return Some(match decode_init(text.as_str()) {
            Ok(role) => Ok(role),
            Err(ProtocolError::UnknownClient(_)) => Err("Unknown client type"),
            Err(_) => Err("Invalid initialization"),
        });
    }
}

async fn close(socket: &mut WebSocket, reason: &str) {
    let frame = CloseFrame {
        code: POLICY_VIOLATION,
        reason: reason.to_owned().into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}
