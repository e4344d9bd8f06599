//! Score and best-score tracking.

use std::fmt;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::rules::Merge;
use crate::store::{BEST_SCORE_KEY, ScoreStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreState {
    pub score: u64,
    pub best: u64,
}

/// Each merge is worth `2^value` of the value it produced.
pub struct ScoreManager {
    state: ScoreState,
    store: Box<dyn ScoreStore + Send>,
    tx: watch::Sender<ScoreState>,
}

impl fmt::Debug for ScoreManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreManager")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ScoreManager {
    /// Starts at zero with the best score read from `store`.
    #[must_use]
    pub fn new(store: Box<dyn ScoreStore + Send>) -> Self {
        let best = match store.get(BEST_SCORE_KEY) {
            Ok(best) => best.unwrap_or_default(),
            Err(err) => {
                warn!("Could not read best score: {err}");
                0
            }
        };
        let state = ScoreState { score: 0, best };
        let (tx, _) = watch::channel(state);
        Self { state, store, tx }
    }

    #[must_use]
    pub fn state(&self) -> ScoreState {
        self.state
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScoreState> {
        self.tx.subscribe()
    }

    pub fn record(&mut self, merges: &[Merge]) {
        if merges.is_empty() {
            return;
        }
        let gained = merges
            .iter()
            .map(|merge| 1u64.checked_shl(merge.value).unwrap_or(u64::MAX))
            .fold(0u64, u64::saturating_add);
        self.state.score = self.state.score.saturating_add(gained);
        debug!(gained, score = self.state.score, "Scored merges");

        if self.state.score > self.state.best {
            self.state.best = self.state.score;
            if let Err(err) = self.store.set(BEST_SCORE_KEY, self.state.best) {
                warn!("Could not persist best score: {err}");
            }
        }
        self.tx.send_replace(self.state);
    }
}
