// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Walkview: live terminal viewer for model-based test runs.
//!
//! A test executor ("reporter") streams run events through a websocket relay; the viewer replays
//! them onto the model graph as visit counts, a moving current-step highlight, failure marks and
//! coverage figures.

pub mod config;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod relay;
pub mod render;
pub mod router;
pub mod transport;
pub mod tui;
