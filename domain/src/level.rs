use tokio::sync::watch;
use tracing::info;

/// The level trails the largest value on the board by this much.
const LEVEL_OFFSET: u32 = 6;

/// Monotonic level. The level is also the minimum spawned value.
#[derive(Debug)]
pub struct LevelManager {
    level: u32,
    tx: watch::Sender<u32>,
}

impl Default for LevelManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelManager {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(1);
        Self { level: 1, tx }
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.tx.subscribe()
    }

    /// Raise the level to keep up with `max_value`. Returns true on change.
    pub fn upgrade_if_needed(&mut self, max_value: Option<u32>) -> bool {
        let Some(max_value) = max_value else {
            return false;
        };
        let next = self.level.max(max_value.saturating_sub(LEVEL_OFFSET)).max(1);
        if next == self.level {
            return false;
        }
        info!(from = self.level, to = next, "Level up");
        self.level = next;
        self.tx.send_replace(next);
        true
    }
}
