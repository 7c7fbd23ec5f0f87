// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Pairing state of the relay: at most one reporter and one viewer.
//!
//! The hub is synchronous and never awaits; connection tasks push into it and drain their own
//! outbound channel.

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use super::RelayError;
use crate::protocol::{encode_outbound, message_kind, ClientRole, Outbound};

pub type PeerSender = UnboundedSender<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

#[derive(Debug)]
struct Slot {
    id: ConnectionId,
    tx: PeerSender,
}

#[derive(Debug, Default)]
pub struct RelayHub {
    next_id: u64,
    reporter: Option<Slot>,
    viewer: Option<Slot>,
    /// Latest `start` from the reporter, replayed to every viewer that connects.
    buffered_start: Option<String>,
}

impl RelayHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self, role: ClientRole) -> bool {
        self.slot(role).is_some()
    }

    pub fn buffered_start(&self) -> Option<&str> {
        self.buffered_start.as_deref()
    }

    pub fn register(&mut self, role: ClientRole, tx: PeerSender) -> Result<ConnectionId, RelayError> {
        if self.slot(role).is_some() {
            return Err(RelayError::already_connected(role));
        }
        self.next_id += 1;
        let id = ConnectionId(self.next_id);

        if role == ClientRole::Viewer {
            if let Some(start) = &self.buffered_start {
                tracing::debug!("replaying buffered start to viewer");
                let _ = tx.send(start.clone());
            }
        }
        *self.slot_mut(role) = Some(Slot { id, tx });
        tracing::info!(role = role.as_str(), "peer connected");

        if role == ClientRole::Viewer {
            match encode_outbound(&Outbound::Start) {
                Ok(ack) => self.send_to(ClientRole::Reporter, ack),
                Err(err) => tracing::error!(error = %err, "cannot encode start acknowledgement"),
            }
        }
        Ok(id)
    }

    /// Frees the slot if it still belongs to connection `id`.
    pub fn unregister(&mut self, role: ClientRole, id: ConnectionId) {
        let slot = self.slot_mut(role);
        if slot.as_ref().is_some_and(|slot| slot.id == id) {
            *slot = None;
            tracing::info!(role = role.as_str(), "peer disconnected");
        }
    }

    /// Forwards one text frame from `from` to the opposite peer.
    pub fn route(&mut self, from: ClientRole, text: &str) {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(from = from.as_str(), error = %err, "dropping malformed frame");
                return;
            }
        };
        let kind = message_kind(&value).unwrap_or("unknown");
        tracing::debug!(from = from.as_str(), kind, "relaying");

        match from {
            ClientRole::Reporter => {
                if kind == "start" {
                    self.buffered_start = Some(text.to_owned());
                }
                self.send_to(ClientRole::Viewer, text.to_owned());
            }
            ClientRole::Viewer => self.send_to(ClientRole::Reporter, text.to_owned()),
        }
    }

    fn send_to(&mut self, role: ClientRole, text: String) {
        let slot = self.slot_mut(role);
        let Some(peer) = slot.as_ref() else {
            tracing::debug!(to = role.as_str(), "no peer to forward to");
            return;
        };
        if peer.tx.send(text).is_err() {
            tracing::warn!(to = role.as_str(), "peer channel closed; dropping slot");
            *slot = None;
        }
    }

    fn slot(&self, role: ClientRole) -> Option<&Slot> {
        match role {
            ClientRole::Reporter => self.reporter.as_ref(),
            ClientRole::Viewer => self.viewer.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: ClientRole) -> &mut Option<Slot> {
        match role {
            ClientRole::Reporter => &mut self.reporter,
            ClientRole::Viewer => &mut self.viewer,
        }
    }
}
