//! Blockfall binary: terminal session and frame loop.
//!
//! ```text
//! main() -> TerminalSession::new() -> run_app() -> App + TUI
//! ```
//!
//! The loop runs on a fixed 8ms cadence:
//!
//! 1. Wait for frame tick
//! 2. Drain input queue (non-blocking via [`blockfall_tui::InputPump`])
//! 3. Advance the scene by the measured frame delta (`app.tick()`)
//! 4. Render frame

use std::fs::{self, File, OpenOptions};
use std::io::{Stdout, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use blockfall_config::{BlockfallConfig, Settings, completion_from_env, data_dir};
use blockfall_domain::FileScoreStore;
use blockfall_engine::App;
use blockfall_tui::{InputPump, draw, handle_events};

const FRAME_DURATION: Duration = Duration::from_millis(8);

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than write over the board.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.blockfall/logs/blockfall.log
    if let Some(dir) = data_dir() {
        candidates.push(dir.join("logs").join("blockfall.log"));
    }

    // Fallback: ./.blockfall/logs/blockfall.log
    candidates.push(PathBuf::from(".blockfall").join("logs").join("blockfall.log"));

    candidates
}

/// Config file plus environment, falling back to defaults on any error.
fn load_settings() -> Settings {
    let config = match BlockfallConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            warn!("Ignoring config: {err}");
            BlockfallConfig::default()
        }
    };
    match config.resolve(completion_from_env()) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("Ignoring config: {err}");
            Settings::default()
        }
    }
}

fn scores_path(settings: &Settings) -> PathBuf {
    settings
        .scores_path
        .clone()
        .or_else(|| data_dir().map(|dir| dir.join("scores.json")))
        .unwrap_or_else(|| PathBuf::from(".blockfall").join("scores.json"))
}

/// Raw mode, alternate screen and mouse capture for as long as it lives.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            let _ = execute!(out, DisableMouseCapture, LeaveAlternateScreen);
            return Err(err.into());
        }

        match Terminal::new(CrosstermBackend::new(out)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen);
                Err(err.into())
            }
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = load_settings();
    info!(
        columns = settings.board.columns,
        rows = settings.board.rows,
        completion = ?settings.animation.completion,
        "Starting"
    );
    let store = FileScoreStore::new(scores_path(&settings));
    let mut app = App::new(&settings, Box::new(store), None);

    let result = {
        let mut session = TerminalSession::new()?;
        run_app(&mut session.terminal, &mut app).await
    };

    if let Err(err) = &result {
        eprintln!("Error: {err:?}");
    }
    let score = app.score();
    println!("Score {}  Best {}", score.score, score.best);
    result
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let mut input = InputPump::new();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        frames.tick().await;

        let size = match terminal.size() {
            Ok(size) => size,
            Err(e) => break Err(e.into()),
        };
        let area = Rect::new(0, 0, size.width, size.height);
        if let Err(e) = handle_events(app, &mut input, area) {
            break Err(e);
        }
        if app.should_quit() {
            break Ok(());
        }

        let delta = app.frame_elapsed();
        if let Err(violation) = app.tick(delta) {
            break Err(violation.into());
        }

        if let Err(e) = terminal.draw(|frame| draw(frame, app)) {
            break Err(e.into());
        }
    };

    input.shutdown().await;
    result
}
