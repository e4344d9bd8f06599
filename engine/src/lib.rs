//! Animation core for Blockfall.
//!
//! Keeps a mirror of visual entities in step with the domain's grid
//! snapshots, runs one motion per entity per phase, and decides when a phase
//! is finished so the domain may move on. This crate has no terminal
//! dependencies; the TUI reads everything it draws from [`App`].

mod barrier;
mod entity;
mod layout;
mod mirror;
mod motion;
mod orchestrator;
mod scene;

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::info;

use blockfall_config::Settings;
use blockfall_domain::{Game, ScoreState, ScoreStore};
use blockfall_types::{ContractViolation, GlobalPhase};

pub use barrier::{CompletionAggregator, Debouncer, PulseOutcome};
pub use entity::{AnimatedEntity, Completion, Ghost, LocalPhase};
pub use layout::BoardLayout;
pub use mirror::{MirrorStore, Reconciled};
pub use motion::{Fade, Motion, Translate, ease_out_cubic};
pub use orchestrator::{
    AdvanceRequest, Orchestrator, PhaseEntry, PhaseSignal, REJECTED_RETRY_DELAY,
};
pub use scene::{Scene, SceneEvent};

pub use blockfall_config::CompletionStrategy;
pub use blockfall_domain::{CommitError, PhaseRequestError, PlaygroundPort};
pub use blockfall_types::{BlockId, GridPos, Point};

/// One game session as the UI sees it.
#[derive(Debug)]
pub struct App {
    scene: Scene<Game>,
    cursor: usize,
    status: Option<String>,
    should_quit: bool,
    game_over: bool,
    score: watch::Receiver<ScoreState>,
    level: watch::Receiver<u32>,
    last_frame: Instant,
}

impl App {
    #[must_use]
    pub fn new(settings: &Settings, store: Box<dyn ScoreStore + Send>, seed: Option<u64>) -> Self {
        let game = Game::new(settings.board.columns, settings.board.rows, store, seed);
        Self::with_game(game, settings)
    }

    #[must_use]
    pub fn with_game(game: Game, settings: &Settings) -> Self {
        let score = game.score_updates();
        let level = game.level_updates();
        let layout = BoardLayout::from_settings(&settings.board, &settings.layout);
        Self {
            scene: Scene::new(game, layout, &settings.animation),
            cursor: settings.board.columns / 2,
            status: None,
            should_quit: false,
            game_over: false,
            score,
            level,
            last_frame: Instant::now(),
        }
    }

    /// Wall time since the previous call.
    pub fn frame_elapsed(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        elapsed
    }

    pub fn tick(&mut self, delta: Duration) -> Result<(), ContractViolation> {
        self.scene.tick(delta)?;
        for event in self.scene.take_events() {
            match event {
                SceneEvent::PhaseEntered {
                    phase: GlobalPhase::Static,
                    ..
                } if !self.game_over && self.scene.port().is_game_over() => {
                    self.game_over = true;
                    info!(score = self.score().score, "Board full");
                    self.status = Some("Game over. Press q to quit.".to_string());
                }
                SceneEvent::RequestRejected { error, .. } => {
                    self.status = Some(error.to_string());
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let last = self.columns().saturating_sub(1);
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    pub fn select_column(&mut self, column: usize) {
        if column < self.columns() {
            self.cursor = column;
        }
    }

    pub fn commit_selected(&mut self) {
        self.commit(self.cursor);
    }

    /// Drop a block into `column`. Refusals end up in the status line.
    pub fn commit(&mut self, column: usize) {
        self.select_column(column);
        match self.scene.commit(column) {
            Ok(()) => self.status = None,
            Err(err) => {
                if !matches!(err, CommitError::Busy { .. }) {
                    self.status = Some(err.to_string());
                }
            }
        }
    }

    #[must_use]
    pub fn scene(&self) -> &Scene<Game> {
        &self.scene
    }

    #[must_use]
    pub fn layout(&self) -> &BoardLayout {
        self.scene.layout()
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.scene.layout().columns()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.status.as_deref()
    }

    #[must_use]
    pub fn score(&self) -> ScoreState {
        *self.score.borrow()
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        *self.level.borrow()
    }

    #[must_use]
    pub fn upcoming(&self) -> u32 {
        self.scene.port().upcoming()
    }

    /// Phase name for display; blank until the first snapshot arrives.
    #[must_use]
    pub fn phase_label(&self) -> &'static str {
        self.scene.phase().map_or("", GlobalPhase::as_str)
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }
}
