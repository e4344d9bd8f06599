//! Reference domain model for Blockfall.
//!
//! The animation engine treats everything in this crate as an external
//! collaborator reached through [`PlaygroundPort`]. Grid truth lives here and
//! is published as [`GridSnapshot`]s on a `watch` channel; the engine only
//! ever asks for the next phase.

mod game;
mod level;
mod playground;
mod rules;
mod score;
mod store;

use thiserror::Error;
use tokio::sync::watch;

use blockfall_types::{GlobalPhase, GridSnapshot};

pub use game::Game;
pub use level::LevelManager;
pub use playground::PlaygroundManager;
pub use rules::Merge;
pub use score::{ScoreManager, ScoreState};
pub use store::{BEST_SCORE_KEY, FileScoreStore, MemoryScoreStore, ScoreStore, StoreError};

/// The engine's view of the domain model.
///
/// Entries into a phase are asserted by the domain through `snapshot.phase`;
/// exits are requested by the engine through [`PlaygroundPort::request_phase`].
pub trait PlaygroundPort {
    /// Snapshot stream. The current value is the latest grid state.
    fn subscribe(&self) -> watch::Receiver<GridSnapshot>;

    /// Drop a new block into `column`.
    fn commit(&mut self, column: usize) -> Result<(), CommitError>;

    /// Ask the domain to leave the current animated phase for `phase`.
    fn request_phase(&mut self, phase: GlobalPhase) -> Result<(), PhaseRequestError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("column {column} does not exist (board has {columns})")]
    ColumnOutOfRange { column: usize, columns: usize },
    #[error("column {column} is full")]
    ColumnFull { column: usize },
    #[error("the board is busy ({phase})")]
    Busy { phase: GlobalPhase },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseRequestError {
    #[error("cannot enter {requested} from {current}")]
    OutOfOrder {
        current: GlobalPhase,
        requested: GlobalPhase,
    },
    #[error("{0} is entered by the playground itself, never on request")]
    NotRequestable(GlobalPhase),
}
