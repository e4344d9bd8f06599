//! Phase-driven playground state.

use std::collections::VecDeque;
use std::mem;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use blockfall_types::{BlockIdAllocator, GlobalPhase, GridPos, GridSnapshot};

use crate::rules::{Block, Board, Merge};
use crate::{CommitError, PhaseRequestError, PlaygroundPort};

/// Spawned values are drawn from `min_value..min_value + SPAWN_SPREAD`.
const SPAWN_SPREAD: u32 = 5;

/// Owns the board and the global phase, and publishes every change.
#[derive(Debug)]
pub struct PlaygroundManager {
    board: Board,
    phase: GlobalPhase,
    ids: BlockIdAllocator,
    rng: StdRng,
    min_value: u32,
    upcoming: VecDeque<u32>,
    stamp: u64,
    merges: Vec<Merge>,
    tx: watch::Sender<GridSnapshot>,
}

impl PlaygroundManager {
    /// An empty board. `seed` makes spawned values reproducible.
    #[must_use]
    pub fn new(columns: usize, rows: usize, seed: Option<u64>) -> Self {
        let board = Board::new(columns, rows);
        let (tx, _) = watch::channel(board.snapshot(GlobalPhase::Static));
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut playground = Self {
            board,
            phase: GlobalPhase::Static,
            ids: BlockIdAllocator::new(),
            rng,
            min_value: 1,
            upcoming: VecDeque::new(),
            stamp: 0,
            merges: Vec::new(),
            tx,
        };
        playground.refill_upcoming();
        playground
    }

    #[must_use]
    pub fn phase(&self) -> GlobalPhase {
        self.phase
    }

    #[must_use]
    pub fn snapshot(&self) -> GridSnapshot {
        self.board.snapshot(self.phase)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<GridSnapshot> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn max_value(&self) -> Option<u32> {
        self.board.max_value()
    }

    #[must_use]
    pub fn min_value(&self) -> u32 {
        self.min_value
    }

    /// Value of the next committed block.
    #[must_use]
    pub fn upcoming(&self) -> u32 {
        self.upcoming
            .front()
            .copied()
            .unwrap_or(self.min_value)
            .max(self.min_value)
    }

    /// Replace the upcoming values; random values follow once they run out.
    pub fn set_upcoming(&mut self, values: impl IntoIterator<Item = u32>) {
        self.upcoming = values.into_iter().collect();
        self.refill_upcoming();
    }

    pub fn set_min_value(&mut self, value: u32) {
        if value != self.min_value {
            info!(min_value = value, "Raising minimum spawn value");
        }
        self.min_value = value.max(1);
    }

    /// No column can take another block.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase == GlobalPhase::Static && self.board.is_full()
    }

    /// Merges applied since the last call.
    pub fn take_merges(&mut self) -> Vec<Merge> {
        mem::take(&mut self.merges)
    }

    pub fn commit(&mut self, column: usize) -> Result<(), CommitError> {
        if self.phase != GlobalPhase::Static {
            return Err(CommitError::Busy { phase: self.phase });
        }
        let columns = self.board.columns();
        if column >= columns {
            return Err(CommitError::ColumnOutOfRange { column, columns });
        }
        let row = self
            .board
            .first_empty_row(column)
            .ok_or(CommitError::ColumnFull { column })?;

        let stamp = self.next_stamp();
        let value = self.upcoming();
        self.upcoming.pop_front();
        self.refill_upcoming();
        let id = self.ids.allocate();
        self.board
            .put(GridPos::new(column, row), Block::spawn(id, value, stamp));
        debug!(%id, column, row, value, "Committed block");

        self.enter(GlobalPhase::Placing);
        Ok(())
    }

    pub fn request_phase(&mut self, requested: GlobalPhase) -> Result<(), PhaseRequestError> {
        let expected_from = match requested {
            GlobalPhase::Collapsing => GlobalPhase::Placing,
            GlobalPhase::Moving => GlobalPhase::Collapsing,
            GlobalPhase::Static => GlobalPhase::Moving,
            GlobalPhase::Placing => return Err(PhaseRequestError::NotRequestable(requested)),
        };
        if self.phase != expected_from {
            warn!(current = %self.phase, %requested, "Rejected out-of-order phase request");
            return Err(PhaseRequestError::OutOfOrder {
                current: self.phase,
                requested,
            });
        }

        match requested {
            GlobalPhase::Collapsing => {
                self.board.clear_entering();
                self.evaluate_collapses();
            }
            GlobalPhase::Moving => {
                let stamp = self.next_stamp();
                let merges = self.board.apply_collapses(stamp);
                debug!(merges = merges.len(), "Applied collapses");
                self.merges.extend(merges);
                let moving = self.board.mark_falls();
                debug!(moving, "Marked falling blocks");
                self.enter(GlobalPhase::Moving);
            }
            GlobalPhase::Static => {
                let stamp = self.next_stamp();
                self.board.apply_falls(stamp);
                // Settled blocks may form new groups: answer with another
                // collapse instead of resting.
                if self.board.mark_collapses() > 0 {
                    info!("Chain reaction");
                    self.enter(GlobalPhase::Collapsing);
                } else {
                    self.board.clear_fresh();
                    self.enter(GlobalPhase::Static);
                }
            }
            GlobalPhase::Placing => {}
        }
        Ok(())
    }

    fn evaluate_collapses(&mut self) {
        let groups = self.board.mark_collapses();
        debug!(groups, "Evaluated collapses");
        self.enter(GlobalPhase::Collapsing);
    }

    fn enter(&mut self, phase: GlobalPhase) {
        debug!(from = %self.phase, to = %phase, "Playground phase");
        self.phase = phase;
        self.tx.send_replace(self.board.snapshot(phase));
    }

    fn refill_upcoming(&mut self) {
        if self.upcoming.is_empty() {
            let value = self
                .rng
                .random_range(self.min_value..self.min_value + SPAWN_SPREAD);
            self.upcoming.push_back(value);
        }
    }

    fn next_stamp(&mut self) -> u64 {
        self.stamp += 1;
        self.stamp
    }
}

impl PlaygroundPort for PlaygroundManager {
    fn subscribe(&self) -> watch::Receiver<GridSnapshot> {
        PlaygroundManager::subscribe(self)
    }

    fn commit(&mut self, column: usize) -> Result<(), CommitError> {
        PlaygroundManager::commit(self, column)
    }

    fn request_phase(&mut self, phase: GlobalPhase) -> Result<(), PhaseRequestError> {
        PlaygroundManager::request_phase(self, phase)
    }
}
