// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Walkview CLI entrypoint.
//!
//! By default this connects to the relay as a viewer and runs the terminal UI. `--headless` logs
//! render calls and prints step output instead. `serve` runs the relay itself.

use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use walkview::config::{RelayConfig, UiMode, ViewerConfig, ViewerOverrides};
use walkview::logging::{init_logging, LogTarget};
use walkview::render::{LogBridge, RenderBridge};
use walkview::router::{ConsoleSink, EventRouter, OutputSink};
use walkview::transport::ViewerConnection;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--url <ws-url>] [--headless] [--saturation <n>] [--reconnect-ms <ms>] [--log-file <path>] [--verbose]\n  {program} serve [--host <host>] [--port <port>] [--verbose]\n\nThe viewer connects to the relay at --url (default ws://localhost:5555/) and shows the live run.\n--headless logs render calls and prints step output instead of drawing the terminal UI.\n--saturation sets the visit count at which the visit color is fully saturated (default 5).\n\n`serve` runs the relay that pairs one reporter with one viewer (default localhost:5555).\n\nEnvironment: WALKVIEW_URL, WALKVIEW_SATURATION, WALKVIEW_VISIT_COLORS=#start,#end,\nWALKVIEW_FAILED_COLOR=#rrggbb, RUST_LOG. Flags win over the environment."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    serve: bool,
    url: Option<String>,
    headless: bool,
    saturation: Option<u32>,
    reconnect_ms: Option<u64>,
    log_file: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    verbose: bool,
}

impl CliOptions {
    fn viewer_overrides(self) -> ViewerOverrides {
        ViewerOverrides {
            url: self.url,
            headless: self.headless,
            saturation: self.saturation,
            reconnect_ms: self.reconnect_ms,
            log_file: self.log_file,
            verbose: self.verbose,
        }
    }

    fn relay_config(self) -> RelayConfig {
        let defaults = RelayConfig::default();
        RelayConfig {
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            verbose: self.verbose,
        }
    }

    fn has_viewer_flags(&self) -> bool {
        self.url.is_some()
            || self.headless
            || self.saturation.is_some()
            || self.reconnect_ms.is_some()
            || self.log_file.is_some()
    }

    fn has_relay_flags(&self) -> bool {
        self.host.is_some() || self.port.is_some()
    }
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    fn set_once<T>(slot: &mut Option<T>, value: T) -> Result<(), ()> {
        if slot.is_some() {
            return Err(());
        }
        *slot = Some(value);
        Ok(())
    }

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" => set_once(&mut options.url, args.next().ok_or(())?)?,
            "--headless" => {
                if options.headless {
                    return Err(());
                }
                options.headless = true;
            }
            "--saturation" => {
                let raw = args.next().ok_or(())?;
                let saturation: u32 = raw.parse().map_err(|_| ())?;
                if saturation == 0 {
                    return Err(());
                }
                set_once(&mut options.saturation, saturation)?;
            }
            "--reconnect-ms" => {
                let raw = args.next().ok_or(())?;
                set_once(&mut options.reconnect_ms, raw.parse().map_err(|_| ())?)?;
            }
            "--log-file" => {
                set_once(&mut options.log_file, PathBuf::from(args.next().ok_or(())?))?;
            }
            "--host" => set_once(&mut options.host, args.next().ok_or(())?)?,
            "--port" => {
                let raw = args.next().ok_or(())?;
                set_once(&mut options.port, raw.parse().map_err(|_| ())?)?;
            }
            "--verbose" | "-v" => {
                if options.verbose {
                    return Err(());
                }
                options.verbose = true;
            }
            "serve" => {
                if options.serve {
                    return Err(());
                }
                options.serve = true;
            }
            _ => return Err(()),
        }
    }

    if options.serve && options.has_viewer_flags() {
        return Err(());
    }
    if !options.serve && options.has_relay_flags() {
        return Err(());
    }

    Ok(options)
}

const HEADLESS_POLL: Duration = Duration::from_millis(250);

fn run_headless(config: &ViewerConfig) -> Result<(), Box<dyn Error>> {
    let stop = Arc::new(AtomicBool::new(false));
    stop_on_ctrl_c(Arc::clone(&stop))?;

    let connection = ViewerConnection::spawn(config.transport())?;
    let mut router = EventRouter::new(LogBridge::new(config.visit_scale), ConsoleSink);
    tracing::info!(url = %config.url, "headless viewer started");

    drive_until_stopped(connection, &mut router, &stop);
    tracing::info!("headless viewer stopped");
    Ok(())
}

/// Feeds transport events to the router until `stop` is set or the transport thread exits, then
/// shuts the transport down.
fn drive_until_stopped<B: RenderBridge, S: OutputSink>(
    connection: ViewerConnection,
    router: &mut EventRouter<B, S>,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Relaxed) {
        match connection.recv_timeout(HEADLESS_POLL) {
            Some(event) => router.dispatch(event),
            None if connection.is_finished() => break,
            None => {}
        }
    }
    connection.shutdown();
}

/// Sets `stop` on the first ctrl-c. The watcher thread owns a small runtime of its own.
fn stop_on_ctrl_c(stop: Arc<AtomicBool>) -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    std::thread::Builder::new()
        .name("walkview-signal".to_owned())
        .spawn(move || {
            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => stop.store(true, Ordering::Relaxed),
                    Err(err) => tracing::warn!(%err, "ctrl-c handler unavailable"),
                }
            });
        })?;
    Ok(())
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "walkview".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        if options.serve {
            let config = options.relay_config();
            init_logging(LogTarget::Stderr, config.verbose)?;
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            runtime.block_on(walkview::relay::serve(&config))?;
            return Ok(());
        }

        let config = ViewerConfig::load(options.viewer_overrides())?;
        init_logging(LogTarget::for_viewer(&config), config.verbose)?;
        match config.mode {
            UiMode::Terminal => walkview::tui::run(&config)?,
            UiMode::Headless => run_headless(&config)?,
        }
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("walkview: {err}");
        std::process::exit(1);
    }
}
