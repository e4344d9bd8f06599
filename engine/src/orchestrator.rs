//! Global phase state machine.
//!
//! The domain asserts phase entries through `snapshot.phase`. The orchestrator
//! decides exits: once the completion channel of the current phase fires it
//! produces an [`AdvanceRequest`] for the domain.

use std::time::Duration;

use tracing::{debug, info, warn};

use blockfall_config::CompletionStrategy;
use blockfall_types::{ContractViolation, GlobalPhase, GridSnapshot, PhaseKind};

use crate::barrier::{CompletionAggregator, PulseOutcome};
use crate::entity::Completion;
use crate::layout::BoardLayout;
use crate::mirror::{MirrorStore, Reconciled};

/// Wait before asking again for a transition the domain refused.
pub const REJECTED_RETRY_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceRequest {
    pub from: GlobalPhase,
    pub to: GlobalPhase,
}

/// A phase entered on a snapshot, and the motions its bulk action started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseEntry {
    pub phase: GlobalPhase,
    pub started: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSignal {
    Advance(AdvanceRequest),
    /// A channel fired for a phase that is no longer current.
    Stray(PhaseKind),
}

#[derive(Debug)]
pub struct Orchestrator {
    /// Current phase; set on entry and on every advance request.
    phase: Option<GlobalPhase>,
    /// Phase whose bulk action last ran.
    dispatched: Option<GlobalPhase>,
    aggregator: CompletionAggregator,
    /// Refused completion to replay, and when.
    retry: Option<(PhaseKind, Duration)>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(strategy: CompletionStrategy) -> Self {
        Self {
            phase: None,
            dispatched: None,
            aggregator: CompletionAggregator::new(strategy),
            retry: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Option<GlobalPhase> {
        self.phase
    }

    #[must_use]
    pub fn aggregator(&self) -> &CompletionAggregator {
        &self.aggregator
    }

    /// Reconcile `snapshot` into `mirror` and, on a phase entry, run the
    /// phase's bulk action once.
    pub fn on_snapshot(
        &mut self,
        snapshot: &GridSnapshot,
        mirror: &mut MirrorStore,
        layout: &BoardLayout,
        duration: Duration,
    ) -> Result<Option<PhaseEntry>, ContractViolation> {
        let reconciled = mirror.reconcile(snapshot, layout, duration)?;
        let phase = snapshot.phase;
        if self.dispatched == Some(phase) {
            return Ok(None);
        }
        self.dispatched = Some(phase);
        self.phase = Some(phase);
        self.retry = None;

        let started = match phase {
            GlobalPhase::Placing => match reconciled {
                Reconciled::Rebuilt { placements } => placements,
                Reconciled::Updated => 0,
            },
            GlobalPhase::Collapsing => mirror.collapse_all(layout, duration),
            GlobalPhase::Moving => mirror.move_all(layout, duration),
            GlobalPhase::Static => 0,
        };
        if let Some(kind) = phase.completion_kind() {
            self.aggregator.expect(kind, started);
        }
        info!(%phase, started, "Entered phase");
        Ok(Some(PhaseEntry { phase, started }))
    }

    pub fn on_completion(&mut self, completion: Completion, now: Duration) -> PulseOutcome {
        let outcome = self.aggregator.pulse(completion.kind, now);
        if outcome == PulseOutcome::Stray {
            warn!(
                id = %completion.id,
                kind = %completion.kind,
                phase = ?self.phase,
                "Completion arrived after its phase ended"
            );
        }
        outcome
    }

    /// Next transition or straggler signal at `now`.
    pub fn poll(&mut self, now: Duration) -> Option<PhaseSignal> {
        let kind = match self.retry {
            Some((kind, at)) if now >= at => {
                self.retry = None;
                debug!(%kind, "Retrying refused phase request");
                kind
            }
            _ => self.aggregator.poll(now)?,
        };
        if self.phase != Some(kind.phase()) {
            warn!(
                %kind,
                phase = ?self.phase,
                "Phase completion does not match the current phase"
            );
            return Some(PhaseSignal::Stray(kind));
        }
        self.aggregator.reset(kind);
        let request = AdvanceRequest {
            from: kind.phase(),
            to: kind.next_phase(),
        };
        self.phase = Some(request.to);
        debug!(from = %request.from, to = %request.to, "Requesting phase");
        Some(PhaseSignal::Advance(request))
    }

    /// STATIC has been entered, not merely requested.
    #[must_use]
    pub fn is_resting(&self) -> bool {
        self.phase == Some(GlobalPhase::Static) && self.dispatched == Some(GlobalPhase::Static)
    }

    /// The domain refused `request`; fall back to the phase it came from and
    /// ask again after [`REJECTED_RETRY_DELAY`] unless a snapshot moves the
    /// board on first.
    pub fn request_rejected(&mut self, request: AdvanceRequest, now: Duration) {
        if self.phase != Some(request.to) {
            return;
        }
        self.phase = Some(request.from);
        if let Some(kind) = request.from.completion_kind() {
            self.retry = Some((kind, now.saturating_add(REJECTED_RETRY_DELAY)));
        }
    }
}
