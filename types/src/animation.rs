//! Frame-driven effect timers.

use std::time::Duration;

/// Elapsed-time accumulator for one timed effect.
///
/// Time only moves when the owner calls [`EffectTimer::advance`], so every
/// motion on the board shares the scene clock and tests can step it exactly.
#[derive(Debug, Clone)]
pub struct EffectTimer {
    elapsed: Duration,
    duration: Duration,
}

impl EffectTimer {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration,
        }
    }

    pub fn advance(&mut self, delta: Duration) {
        self.elapsed = self.elapsed.saturating_add(delta).min(self.duration);
    }

    /// Linear progress in `0.0..=1.0`. A zero-length effect is already done.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}
