// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! JSON wire messages exchanged with the relay.
//!
//! Inbound messages are decoded once, here, into [`Inbound`]; nothing downstream looks at raw
//! JSON again.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::adapter::lenient_string;
use crate::model::{RawModelContainer, RawStatistics};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message has no string `type` field")]
    MissingType,
    #[error("expected an `init` message, got `{0}`")]
    NotInit(String),
    #[error("unknown client type `{0}`")]
    UnknownClient(String),
}

/// Element reference carried by `step-start` and `error` messages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StepRef {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    pub model_name: Option<String>,
    pub data: Option<Value>,
}

impl StepRef {
    /// Reference forms in lookup order: raw id, then name.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        [self.id.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|candidate| !candidate.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unnamed step>")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StepError {
    pub message: String,
    pub trace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StepResult {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    pub output: Option<String>,
    pub error: Option<StepError>,
}

fn passed_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Inbound {
    #[serde(rename = "start")]
    Start {
        #[serde(default)]
        models: Vec<RawModelContainer>,
    },
    #[serde(rename = "step-start")]
    StepStart {
        #[serde(default)]
        step: StepRef,
    },
    #[serde(rename = "step-end")]
    StepEnd {
        #[serde(default)]
        result: StepResult,
    },
    #[serde(rename = "end")]
    End {
        #[serde(default = "passed_by_default")]
        status: bool,
        #[serde(default)]
        statistics: Option<RawStatistics>,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: String,
        #[serde(default)]
        trace: Option<String>,
        #[serde(default)]
        step: Option<StepRef>,
    },
    /// A well-formed message of a kind this viewer does not handle.
    #[serde(skip)]
    Unknown { kind: String },
}

impl Inbound {
    pub fn kind(&self) -> &str {
        match self {
            Self::Start { .. } => "start",
            Self::StepStart { .. } => "step-start",
            Self::StepEnd { .. } => "step-end",
            Self::End { .. } => "end",
            Self::Error { .. } => "error",
            Self::Unknown { kind } => kind,
        }
    }
}

const KNOWN_KINDS: [&str; 5] = ["start", "step-start", "step-end", "end", "error"];

/// Reads the `type` field of any JSON message.
pub fn message_kind(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

pub fn decode_inbound(text: &str) -> Result<Inbound, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = message_kind(&value).ok_or(ProtocolError::MissingType)?;
    if !KNOWN_KINDS.contains(&kind) {
        return Ok(Inbound::Unknown {
            kind: kind.to_owned(),
        });
    }
    Ok(serde_json::from_value(value)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    Reporter,
    Viewer,
}

impl ClientRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reporter => "reporter",
            Self::Viewer => "viewer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    Init { client: ClientRole },
    Start,
}

pub fn encode_outbound(message: &Outbound) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

/// Decodes the first message of a relay connection.
pub fn decode_init(text: &str) -> Result<ClientRole, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = message_kind(&value).ok_or(ProtocolError::MissingType)?;
    if kind != "init" {
        return Err(ProtocolError::NotInit(kind.to_owned()));
    }
    let client = value.get("client").and_then(Value::as_str).unwrap_or_default();
    match client {
        "reporter" => Ok(ClientRole::Reporter),
        "viewer" => Ok(ClientRole::Viewer),
        other => Err(ProtocolError::UnknownClient(other.to_owned())),
    }
}
