//! The playground wired to score and level bookkeeping.

use tokio::sync::watch;
use tracing::info;

use blockfall_types::{GlobalPhase, GridSnapshot};

use crate::level::LevelManager;
use crate::playground::PlaygroundManager;
use crate::score::{ScoreManager, ScoreState};
use crate::store::ScoreStore;
use crate::{CommitError, PhaseRequestError, PlaygroundPort};

/// A full game session. This is what the engine drives in the binary.
#[derive(Debug)]
pub struct Game {
    playground: PlaygroundManager,
    score: ScoreManager,
    level: LevelManager,
}

impl Game {
    #[must_use]
    pub fn new(
        columns: usize,
        rows: usize,
        store: Box<dyn ScoreStore + Send>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            playground: PlaygroundManager::new(columns, rows, seed),
            score: ScoreManager::new(store),
            level: LevelManager::new(),
        }
    }

    #[must_use]
    pub fn score_updates(&self) -> watch::Receiver<ScoreState> {
        self.score.subscribe()
    }

    #[must_use]
    pub fn level_updates(&self) -> watch::Receiver<u32> {
        self.level.subscribe()
    }

    #[must_use]
    pub fn score(&self) -> ScoreState {
        self.score.state()
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level.level()
    }

    /// Value the next committed block will carry.
    #[must_use]
    pub fn upcoming(&self) -> u32 {
        self.playground.upcoming()
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.playground.is_game_over()
    }

    #[must_use]
    pub fn snapshot(&self) -> GridSnapshot {
        self.playground.snapshot()
    }

    /// Direct access for scripted sessions.
    pub fn playground_mut(&mut self) -> &mut PlaygroundManager {
        &mut self.playground
    }
}

impl PlaygroundPort for Game {
    fn subscribe(&self) -> watch::Receiver<GridSnapshot> {
        self.playground.subscribe()
    }

    fn commit(&mut self, column: usize) -> Result<(), CommitError> {
        self.playground.commit(column)
    }

    fn request_phase(&mut self, phase: GlobalPhase) -> Result<(), PhaseRequestError> {
        self.playground.request_phase(phase)?;

        let merges = self.playground.take_merges();
        self.score.record(&merges);

        if self.playground.phase() == GlobalPhase::Static {
            if self.level.upgrade_if_needed(self.playground.max_value()) {
                self.playground.set_min_value(self.level.level());
            }
            if self.playground.is_game_over() {
                info!(score = self.score.state().score, "Game over");
            }
        }
        Ok(())
    }
}
