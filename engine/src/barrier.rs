//! Phase completion barriers.
//!
//! Every entity of a phase pulses its channel once when its motion ends. The
//! aggregator turns those pulses into a single "phase done" event per phase,
//! either by counting them down (latch) or by waiting for a quiet window
//! (debounce).

use std::collections::VecDeque;
use std::time::Duration;

use tracing::debug;

use blockfall_config::CompletionStrategy;
use blockfall_types::PhaseKind;

/// Trailing-edge debounce on the scene clock.
///
/// A value fires once `window` has passed without a newer push. A push that
/// arrives at least `window` after the pending one releases the pending value
/// instead of replacing it, so spaced pushes each fire.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Duration)>,
    ready: VecDeque<T>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            ready: VecDeque::new(),
        }
    }

    pub fn push(&mut self, value: T, now: Duration) {
        self.release_expired(now);
        self.pending = Some((value, now));
    }

    /// The next coalesced value whose window has elapsed by `now`.
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        self.release_expired(now);
        self.ready.pop_front()
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.ready.clear();
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_none() && self.ready.is_empty()
    }

    fn release_expired(&mut self, now: Duration) {
        let expired = self
            .pending
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_sub(*at) >= self.window);
        if expired && let Some((value, _)) = self.pending.take() {
            self.ready.push_back(value);
        }
    }
}

/// How a pulse was taken by its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseOutcome {
    Counted,
    /// Nothing on the channel was waiting for it.
    Stray,
}

#[derive(Debug, Clone)]
enum Gate {
    /// `None` while disarmed.
    Latch { remaining: Option<usize> },
    Debounce(Debouncer<()>),
}

#[derive(Debug, Clone)]
struct Channel {
    gate: Gate,
    ready: bool,
}

impl Channel {
    fn new(strategy: CompletionStrategy) -> Self {
        let gate = match strategy {
            CompletionStrategy::Latch => Gate::Latch { remaining: None },
            CompletionStrategy::Debounce { window } => Gate::Debounce(Debouncer::new(window)),
        };
        Self { gate, ready: false }
    }

    fn reset(&mut self) {
        self.ready = false;
        match &mut self.gate {
            Gate::Latch { remaining } => *remaining = None,
            Gate::Debounce(debouncer) => debouncer.clear(),
        }
    }
}

/// One completion channel per [`PhaseKind`].
#[derive(Debug, Clone)]
pub struct CompletionAggregator {
    channels: [Channel; 3],
}

impl CompletionAggregator {
    #[must_use]
    pub fn new(strategy: CompletionStrategy) -> Self {
        Self {
            channels: [
                Channel::new(strategy),
                Channel::new(strategy),
                Channel::new(strategy),
            ],
        }
    }

    /// Arm `kind` for a phase that started `count` motions. Zero completes
    /// at once under every strategy.
    pub fn expect(&mut self, kind: PhaseKind, count: usize) {
        let channel = &mut self.channels[kind.index()];
        channel.reset();
        if count == 0 {
            channel.ready = true;
        } else if let Gate::Latch { remaining } = &mut channel.gate {
            *remaining = Some(count);
        }
        debug!(%kind, count, "Armed completion channel");
    }

    pub fn pulse(&mut self, kind: PhaseKind, now: Duration) -> PulseOutcome {
        let channel = &mut self.channels[kind.index()];
        match &mut channel.gate {
            Gate::Latch { remaining } => match remaining {
                Some(1) => {
                    *remaining = None;
                    channel.ready = true;
                    PulseOutcome::Counted
                }
                Some(left) => {
                    *left -= 1;
                    PulseOutcome::Counted
                }
                None => PulseOutcome::Stray,
            },
            Gate::Debounce(debouncer) => {
                debouncer.push((), now);
                PulseOutcome::Counted
            }
        }
    }

    /// The next channel that completed by `now`.
    pub fn poll(&mut self, now: Duration) -> Option<PhaseKind> {
        for kind in PhaseKind::ALL {
            let channel = &mut self.channels[kind.index()];
            if channel.ready {
                channel.ready = false;
                return Some(kind);
            }
            if let Gate::Debounce(debouncer) = &mut channel.gate
                && debouncer.poll(now).is_some()
            {
                return Some(kind);
            }
        }
        None
    }

    /// Clear `kind` after it triggered a transition.
    pub fn reset(&mut self, kind: PhaseKind) {
        self.channels[kind.index()].reset();
    }

    /// Motions of `kind` still owed a pulse, when counted.
    #[must_use]
    pub fn remaining(&self, kind: PhaseKind) -> Option<usize> {
        match &self.channels[kind.index()].gate {
            Gate::Latch { remaining } => *remaining,
            Gate::Debounce(_) => None,
        }
    }
}
