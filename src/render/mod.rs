// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Render bridge: the narrow contract the router uses to push visual effects to a drawing
//! surface.
//!
//! The core only ever talks to [`RenderBridge`]. Concrete surfaces live elsewhere (the terminal
//! surface in `tui`, [`logging::LogBridge`] for headless runs, [`recording::RecordingBridge`] for
//! tests).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::{Edge, ElementId, Node};

pub mod layout;
pub mod logging;
pub mod recording;

pub use layout::{layer_graph, GraphLayout};
pub use logging::LogBridge;
pub use recording::{RecordingBridge, RenderCall};

/// Visits at which the visit color reaches the saturated end of the scale.
pub const DEFAULT_SATURATION: u32 = 5;
pub const NEUTRAL_VISIT_COLOR: Rgb = Rgb::new(0xd3, 0xd3, 0xd3);
pub const SATURATED_VISIT_COLOR: Rgb = Rgb::new(0x2e, 0x7d, 0x32);
pub const FAILED_COLOR: Rgb = Rgb::new(0xc6, 0x28, 0x28);

/// Operations a rendering surface exposes to the router.
///
/// Calls naming an id the surface does not display are no-ops.
pub trait RenderBridge {
    /// Replaces everything displayed. An empty node list renders nothing.
    fn rebuild_graph(&mut self, nodes: &[Node], edges: &[Edge]);

    fn set_highlight(&mut self, id: &ElementId, on: bool);

    fn set_visit_color(&mut self, id: &ElementId, count: u32);

    /// Failure color sticks until the next [`RenderBridge::rebuild_graph`].
    fn set_failed(&mut self, id: &ElementId);

    /// Re-fits the visible area to the content. Idempotent.
    fn refresh_viewport(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation towards `other`; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let channel = |from: u8, to: u8| -> u8 {
            let from = f64::from(from);
            let to = f64::from(to);
            (from + (to - from) * t).round().clamp(0.0, 255.0) as u8
        };
        Self {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color `{value}` (expected #RRGGBB)")]
pub struct ColorParseError {
    pub value: String,
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let hex = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let err = || ColorParseError {
            value: trimmed.to_owned(),
        };
        if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(err());
        }
        let rgb = u32::from_str_radix(hex, 16).map_err(|_| err())?;
        Ok(Self::new(
            ((rgb >> 16) & 0xff) as u8,
            ((rgb >> 8) & 0xff) as u8,
            (rgb & 0xff) as u8,
        ))
    }
}

/// Two-point linear color scale over visit counts, clamped at `saturation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitColorScale {
    start: Rgb,
    end: Rgb,
    saturation: u32,
}

impl Default for VisitColorScale {
    fn default() -> Self {
        Self::new(NEUTRAL_VISIT_COLOR, SATURATED_VISIT_COLOR, DEFAULT_SATURATION)
    }
}

impl VisitColorScale {
    /// A saturation of 0 is treated as 1.
    pub fn new(start: Rgb, end: Rgb, saturation: u32) -> Self {
        Self {
            start,
            end,
            saturation: saturation.max(1),
        }
    }

    pub fn with_saturation(self, saturation: u32) -> Self {
        Self::new(self.start, self.end, saturation)
    }

    pub fn saturation(&self) -> u32 {
        self.saturation
    }

    pub fn color_for(&self, count: u32) -> Rgb {
        let clamped = count.min(self.saturation);
        self.start
            .lerp(self.end, f64::from(clamped) / f64::from(self.saturation))
    }
}
