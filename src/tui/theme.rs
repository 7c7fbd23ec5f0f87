// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use ratatui::style::{Color, Modifier, Style};

use crate::config::ViewerConfig;
use crate::render::{Rgb, VisitColorScale, FAILED_COLOR};

const BORDER_COLOR: Color = Color::DarkGray;
const TITLE_COLOR: Color = Color::Cyan;
const LABEL_COLOR: Color = Color::Gray;
const ERROR_COLOR: Color = Color::LightRed;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TuiTheme {
    visit_scale: VisitColorScale,
    failed: Rgb,
}

impl Default for TuiTheme {
    fn default() -> Self {
        Self {
            visit_scale: VisitColorScale::default(),
            failed: FAILED_COLOR,
        }
    }
}

impl TuiTheme {
    pub(crate) fn from_config(config: &ViewerConfig) -> Self {
        Self {
            visit_scale: config.visit_scale,
            failed: config.failed_color,
        }
    }

    /// Style of a graph element with `count` visits. Failure wins over the visit color, and the
    /// current element is drawn reversed on top of either.
    pub(crate) fn element_style(&self, count: u32, current: bool, failed: bool) -> Style {
        let fg = if failed {
            self.failed
        } else {
            self.visit_scale.color_for(count)
        };
        let mut style = Style::default().fg(rgb(fg));
        if failed {
            style = style.add_modifier(Modifier::BOLD);
        }
        if current {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        style
    }

    pub(crate) fn panel_border_style(&self) -> Style {
        Style::default().fg(BORDER_COLOR)
    }

    pub(crate) fn title_style(&self) -> Style {
        Style::default().fg(TITLE_COLOR).add_modifier(Modifier::BOLD)
    }

    pub(crate) fn label_style(&self) -> Style {
        Style::default().fg(LABEL_COLOR)
    }

    pub(crate) fn error_style(&self) -> Style {
        Style::default().fg(ERROR_COLOR)
    }

    pub(crate) fn failed_style(&self) -> Style {
        Style::default().fg(rgb(self.failed)).add_modifier(Modifier::BOLD)
    }
}

pub(crate) fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}
