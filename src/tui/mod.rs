// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Terminal UI.
//!
//! Drives an [`EventRouter`] with a [`TerminalSurface`] from the transport channel and draws the
//! graph, edge list, run status and step log with ratatui + crossterm.

use std::{
    error::Error,
    io::{self, Write},
    time::Duration,
};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    terminal::{
        disable_raw_mode, enable_raw_mode, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::config::ViewerConfig;
use crate::model::{RunStatus, Statistics};
use crate::render::RenderBridge;
use crate::router::{BufferedSink, EventRouter, RunPhase, SinkEntry};
use crate::transport::{TransportEvent, ViewerConnection};

mod surface;
mod theme;

pub use surface::TerminalSurface;

use theme::TuiTheme;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const LOG_CAPACITY: usize = 500;
const FOOTER: &str = " q quit · c clear · f fit · ←↑↓→ scroll ";

/// Connects to the relay and runs the interactive viewer until the user quits.
pub fn run(config: &ViewerConfig) -> Result<(), Box<dyn Error>> {
    let connection = ViewerConnection::spawn(config.transport())?;
    let mut terminal = TerminalSession::new(&config.url)?;
    let mut app = App::new(config);

    while !app.should_quit {
        for event in connection.drain() {
            app.apply(event);
        }
        terminal.draw(|frame| draw(frame, &app))?;

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                _ => {}
            }
        }
    }

    let restored = terminal.restore();
    connection.shutdown();
    restored?;
    Ok(())
}

pub struct App {
    router: EventRouter<TerminalSurface, BufferedSink>,
    url: String,
    last_transport_error: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            router: EventRouter::new(
                TerminalSurface::new(TuiTheme::from_config(config)),
                BufferedSink::with_capacity(LOG_CAPACITY),
            ),
            url: config.url.clone(),
            last_transport_error: None,
            should_quit: false,
        }
    }

    pub fn router(&self) -> &EventRouter<TerminalSurface, BufferedSink> {
        &self.router
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn apply(&mut self, event: TransportEvent) {
        match &event {
            TransportEvent::Opened => self.last_transport_error = None,
            TransportEvent::Failed { error } => self.last_transport_error = Some(error.clone()),
            TransportEvent::Closed { reason } => self.last_transport_error = reason.clone(),
            TransportEvent::Message(_) => {}
        }
        self.router.dispatch(event);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        self.handle_key_code(key.code);
    }

    fn handle_key_code(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') => {
                self.router.clear();
                self.router.sink_mut().clear();
            }
            KeyCode::Char('f') => self.router.bridge_mut().refresh_viewport(),
            KeyCode::Left => self.router.bridge_mut().scroll_by(-4, 0),
            KeyCode::Right => self.router.bridge_mut().scroll_by(4, 0),
            KeyCode::Up => self.router.bridge_mut().scroll_by(0, -1),
            KeyCode::Down => self.router.bridge_mut().scroll_by(0, 1),
            _ => {}
        }
    }

    fn connection_line(&self) -> String {
        match (self.router.is_connected(), &self.last_transport_error) {
            (true, _) => format!("connected to {}", self.url),
            (false, Some(error)) => format!("disconnected from {} ({error})", self.url),
            (false, None) => format!("connecting to {}", self.url),
        }
    }

    fn status_lines(&self, theme: &TuiTheme) -> Vec<Line<'static>> {
        let session = self.router.session();
        let field = |name: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("{name:<10}"), theme.label_style()),
                Span::raw(value),
            ])
        };

        let mut lines = vec![
            field("relay", self.connection_line()),
            field("phase", self.router.phase().to_string()),
            field("status", session.status().to_string()),
            field(
                "current",
                session
                    .current_element_id()
                    .map_or_else(|| "-".to_owned(), ToString::to_string),
            ),
        ];
        lines.push(match session.failed_element_id() {
            Some(failed) => Line::from(vec![
                Span::styled(format!("{:<10}", "failed"), theme.label_style()),
                Span::styled(failed.to_string(), theme.failed_style()),
            ]),
            None => field("failed", "-".to_owned()),
        });

        let statistics = match (self.router.phase(), session.statistics()) {
            (RunPhase::Ended, Some(statistics)) => statistics.clone(),
            _ => session.live_statistics(),
        };
        lines.extend(
            statistics_lines(&statistics)
                .into_iter()
                .map(|(name, value)| field(name, value)),
        );
        lines
    }

    fn log_lines(&self, theme: &TuiTheme) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for entry in self.router.sink().entries() {
            match entry {
                SinkEntry::Output(text) => {
                    lines.extend(text.lines().map(|line| Line::raw(line.to_owned())));
                }
                SinkEntry::Error { message, trace } => {
                    lines.push(Line::styled(format!("error: {message}"), theme.error_style()));
                    if let Some(trace) = trace {
                        lines.extend(
                            trace
                                .lines()
                                .map(|line| Line::styled(line.to_owned(), theme.error_style())),
                        );
                    }
                }
                SinkEntry::Finished { status, statistics } => {
                    let style = if *status == RunStatus::Failed {
                        theme.error_style()
                    } else {
                        theme.title_style()
                    };
                    lines.push(Line::styled(
                        format!(
                            "run {status}: edges {}%, vertices {}%",
                            statistics.edge_coverage, statistics.vertex_coverage
                        ),
                        style,
                    ));
                }
            }
        }
        let overflow = lines.len().saturating_sub(LOG_CAPACITY);
        lines.drain(..overflow);
        lines
    }
}

fn statistics_lines(statistics: &Statistics) -> Vec<(&'static str, String)> {
    vec![
        (
            "models",
            format!(
                "{} total, {} completed, {} failed",
                statistics.total_models, statistics.completed_models, statistics.failed_models
            ),
        ),
        (
            "edges",
            format!(
                "{}% ({}/{})",
                statistics.edge_coverage,
                statistics.visited_edges,
                statistics.total_edges()
            ),
        ),
        (
            "vertices",
            format!(
                "{}% ({}/{})",
                statistics.vertex_coverage,
                statistics.visited_vertices,
                statistics.total_vertices()
            ),
        ),
    ]
}

fn draw(frame: &mut Frame<'_>, app: &App) {
    let theme = app.router.bridge().theme();
    let [main, bottom, footer] = split(
        frame.size(),
        Direction::Vertical,
        [Constraint::Min(6), Constraint::Length(10), Constraint::Length(1)],
    );
    let [graph_area, edge_area] = split(
        main,
        Direction::Horizontal,
        [Constraint::Percentage(65), Constraint::Percentage(35)],
    );
    let [status_area, log_area] = split(
        bottom,
        Direction::Horizontal,
        [Constraint::Percentage(40), Constraint::Percentage(60)],
    );

    let surface = app.router.bridge();
    let (scroll_x, scroll_y) = surface.scroll();
    frame.render_widget(
        Paragraph::new(surface.graph_lines())
            .block(panel(&theme, "Graph"))
            .scroll((scroll_y, scroll_x)),
        graph_area,
    );
    frame.render_widget(
        Paragraph::new(surface.edge_lines()).block(panel(&theme, "Edges")),
        edge_area,
    );
    frame.render_widget(
        Paragraph::new(app.status_lines(&theme)).block(panel(&theme, "Run")),
        status_area,
    );

    let log = app.log_lines(&theme);
    let visible = usize::from(log_area.height.saturating_sub(2));
    let tail = log.len().saturating_sub(visible);
    frame.render_widget(
        Paragraph::new(log[tail..].to_vec())
            .block(panel(&theme, "Log"))
            .wrap(Wrap { trim: false }),
        log_area,
    );
    frame.render_widget(
        Paragraph::new(Line::styled(FOOTER, theme.label_style())),
        footer,
    );
}

fn split<const N: usize>(
    area: Rect,
    direction: Direction,
    constraints: [Constraint; N],
) -> [Rect; N] {
    let chunks = Layout::default()
        .direction(direction)
        .constraints(constraints)
        .split(area);
    std::array::from_fn(|idx| chunks[idx])
}

fn panel<'a>(theme: &TuiTheme, title: &'a str) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.panel_border_style())
        .title(Span::styled(format!(" {title} "), theme.title_style()))
}

/// Owns the terminal while the viewer runs. Teardown mirrors setup and also runs on drop and
/// from the panic hook.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    restored: bool,
}

impl TerminalSession {
    fn new(title: &str) -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;
        install_panic_restore();

        let mut stdout = io::stdout();
        write_setup(&mut stdout, title).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self {
            terminal,
            restored: false,
        })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }

    /// Hands the terminal back; errors are reported instead of swallowed as in `Drop`.
    fn restore(mut self) -> io::Result<()> {
        self.restored = true;
        let raw_mode = disable_raw_mode();
        let screen = write_teardown(self.terminal.backend_mut());
        raw_mode.and(screen)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if !self.restored {
            teardown_terminal();
        }
    }
}

fn write_setup(out: &mut impl Write, title: &str) -> io::Result<()> {
    queue!(
        out,
        EnterAlternateScreen,
        DisableLineWrap,
        cursor::Hide,
        SetTitle(format!("walkview · {title}"))
    )?;
    out.flush()
}

fn write_teardown(out: &mut impl Write) -> io::Result<()> {
    queue!(out, cursor::Show, EnableLineWrap, LeaveAlternateScreen)?;
    out.flush()
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let _ = write_teardown(&mut io::stdout());
}

/// A panic inside the draw loop would otherwise print its message into the alternate screen and
/// leave the shell in raw mode.
fn install_panic_restore() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        teardown_terminal();
        previous(info);
    }));
}
