// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime configuration for the viewer and the relay.
//!
//! Values are layered: built-in defaults, then `WALKVIEW_*` environment variables, then command
//! line flags. Environment lookups go through a closure so tests never touch the process
//! environment.

use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::render::{Rgb, VisitColorScale, FAILED_COLOR, NEUTRAL_VISIT_COLOR, SATURATED_VISIT_COLOR};
use crate::transport::TransportConfig;

pub const DEFAULT_URL: &str = "ws://localhost:5555/";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5555;
pub const DEFAULT_RECONNECT_MS: u64 = 1000;

pub const ENV_URL: &str = "WALKVIEW_URL";
pub const ENV_SATURATION: &str = "WALKVIEW_SATURATION";
pub const ENV_VISIT_COLORS: &str = "WALKVIEW_VISIT_COLORS";
pub const ENV_FAILED_COLOR: &str = "WALKVIEW_FAILED_COLOR";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {name} value `{value}`: {reason}")]
    InvalidEnv {
        name: String,
        value: String,
        reason: String,
    },
    #[error("{name} is not valid unicode")]
    NonUnicodeEnv { name: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UiMode {
    #[default]
    Terminal,
    Headless,
}

/// Flags given on the viewer command line. `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerOverrides {
    pub url: Option<String>,
    pub headless: bool,
    pub saturation: Option<u32>,
    pub reconnect_ms: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub url: String,
    pub mode: UiMode,
    pub visit_scale: VisitColorScale,
    pub failed_color: Rgb,
    pub reconnect_delay: Duration,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_owned(),
            mode: UiMode::Terminal,
            visit_scale: VisitColorScale::default(),
            failed_color: FAILED_COLOR,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_MS),
            log_file: None,
            verbose: false,
        }
    }
}

impl ViewerConfig {
    pub fn load(overrides: ViewerOverrides) -> Result<Self, ConfigError> {
        Self::load_with(overrides, |name| std::env::var(name))
    }

    pub fn load_with(
        overrides: ViewerOverrides,
        lookup: impl Fn(&str) -> Result<String, VarError>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = read_env(&lookup, ENV_URL)? {
            config.url = url;
        }

        let mut saturation = config.visit_scale.saturation();
        if let Some(raw) = read_env(&lookup, ENV_SATURATION)? {
            saturation =
                parse_saturation(&raw).map_err(|reason| invalid(ENV_SATURATION, &raw, reason))?;
        }
        let (start, end) = match read_env(&lookup, ENV_VISIT_COLORS)? {
            Some(raw) => parse_color_pair(&raw)
                .map_err(|reason| invalid(ENV_VISIT_COLORS, &raw, reason))?,
            None => (NEUTRAL_VISIT_COLOR, SATURATED_VISIT_COLOR),
        };
        if let Some(raw) = read_env(&lookup, ENV_FAILED_COLOR)? {
            config.failed_color = raw
                .parse::<Rgb>()
                .map_err(|err| invalid(ENV_FAILED_COLOR, &raw, err.to_string()))?;
        }

        if let Some(url) = overrides.url {
            config.url = url;
        }
        if let Some(value) = overrides.saturation {
            saturation = value;
        }
        config.visit_scale = VisitColorScale::new(start, end, saturation);
        if let Some(ms) = overrides.reconnect_ms {
            config.reconnect_delay = Duration::from_millis(ms);
        }
        if overrides.headless {
            config.mode = UiMode::Headless;
        }
        config.log_file = overrides.log_file;
        config.verbose = overrides.verbose;

        Ok(config)
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            url: self.url.clone(),
            reconnect_delay: self.reconnect_delay,
            ..TransportConfig::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub verbose: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            verbose: false,
        }
    }
}

impl RelayConfig {
    pub fn bind_target(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

fn read_env(
    lookup: &impl Fn(&str) -> Result<String, VarError>,
    name: &str,
) -> Result<Option<String>, ConfigError> {
    match lookup(name) {
        Ok(value) => {
            let trimmed = value.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
        }
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::NonUnicodeEnv {
            name: name.to_owned(),
        }),
    }
}

fn invalid(name: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidEnv {
        name: name.to_owned(),
        value: value.to_owned(),
        reason: reason.into(),
    }
}

fn parse_saturation(raw: &str) -> Result<u32, String> {
    match raw.parse::<u32>() {
        Ok(0) => Err("must be at least 1".to_owned()),
        Ok(value) => Ok(value),
        Err(err) => Err(err.to_string()),
    }
}

fn parse_color_pair(raw: &str) -> Result<(Rgb, Rgb), String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [start, end] = parts.as_slice() else {
        return Err(format!("expected 2 comma-separated colors (start,end), got {}", parts.len()));
    };
    let start = start.parse::<Rgb>().map_err(|err| err.to_string())?;
    let end = end.parse::<Rgb>().map_err(|err| err.to_string())?;
    Ok((start, end))
}
