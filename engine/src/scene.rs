//! The frame-stepped scene: snapshot intake, motions, and phase requests.

use std::mem;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use blockfall_config::AnimationSettings;
use blockfall_domain::{CommitError, PhaseRequestError, PlaygroundPort};
use blockfall_types::{BlockId, ContractViolation, GlobalPhase, GridSnapshot, PhaseKind};

use crate::barrier::{Debouncer, PulseOutcome};
use crate::entity::AnimatedEntity;
use crate::layout::BoardLayout;
use crate::mirror::MirrorStore;
use crate::orchestrator::{AdvanceRequest, Orchestrator, PhaseSignal};

/// Something that happened during a [`Scene::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    PhaseEntered { phase: GlobalPhase, started: usize },
    PhaseRequested(AdvanceRequest),
    EntityAbsorbed(BlockId),
    /// A completion nobody was waiting for. `id` is absent for coalesced events.
    StrayCompletion { kind: PhaseKind, id: Option<BlockId> },
    RequestRejected {
        request: AdvanceRequest,
        error: PhaseRequestError,
    },
}

/// Drives one [`PlaygroundPort`] on a virtual clock.
///
/// Nothing moves unless [`Scene::tick`] is called. Within one tick, running
/// motions advance first, then the latest snapshot is taken in, then any
/// finished phase is pushed forward.
#[derive(Debug)]
pub struct Scene<P> {
    port: P,
    snapshots: watch::Receiver<GridSnapshot>,
    throttle: Debouncer<GridSnapshot>,
    mirror: MirrorStore,
    orchestrator: Orchestrator,
    layout: BoardLayout,
    duration: Duration,
    clock: Duration,
    events: Vec<SceneEvent>,
}

impl<P: PlaygroundPort> Scene<P> {
    pub fn new(port: P, layout: BoardLayout, animation: &AnimationSettings) -> Self {
        let mut snapshots = port.subscribe();
        let mut throttle = Debouncer::new(animation.snapshot_throttle);
        throttle.push(snapshots.borrow_and_update().clone(), Duration::ZERO);
        Self {
            port,
            snapshots,
            throttle,
            mirror: MirrorStore::new(),
            orchestrator: Orchestrator::new(animation.completion),
            layout,
            duration: animation.duration,
            clock: Duration::ZERO,
            events: Vec::new(),
        }
    }

    /// Advance the scene by `delta`.
    pub fn tick(&mut self, delta: Duration) -> Result<(), ContractViolation> {
        self.clock = self.clock.saturating_add(delta);
        let now = self.clock;

        for completion in self.mirror.advance(delta) {
            if completion.absorbed {
                self.events.push(SceneEvent::EntityAbsorbed(completion.id));
            }
            if self.orchestrator.on_completion(completion, now) == PulseOutcome::Stray {
                self.events.push(SceneEvent::StrayCompletion {
                    kind: completion.kind,
                    id: Some(completion.id),
                });
            }
        }

        if matches!(self.snapshots.has_changed(), Ok(true)) {
            let snapshot = self.snapshots.borrow_and_update().clone();
            self.throttle.push(snapshot, now);
        }
        while let Some(snapshot) = self.throttle.poll(now) {
            debug!(phase = %snapshot.phase, blocks = snapshot.blocks.len(), "Snapshot");
            if let Some(entry) = self.orchestrator.on_snapshot(
                &snapshot,
                &mut self.mirror,
                &self.layout,
                self.duration,
            )? {
                self.events.push(SceneEvent::PhaseEntered {
                    phase: entry.phase,
                    started: entry.started,
                });
            }
        }

        while let Some(signal) = self.orchestrator.poll(now) {
            match signal {
                PhaseSignal::Advance(request) => {
                    self.events.push(SceneEvent::PhaseRequested(request));
                    if let Err(error) = self.port.request_phase(request.to) {
                        warn!(
                            from = %request.from,
                            to = %request.to,
                            "Phase request rejected: {error}"
                        );
                        self.orchestrator.request_rejected(request, now);
                        self.events.push(SceneEvent::RequestRejected { request, error });
                    }
                }
                PhaseSignal::Stray(kind) => {
                    self.events.push(SceneEvent::StrayCompletion { kind, id: None });
                }
            }
        }
        Ok(())
    }

    /// Forward a player move to the domain.
    pub fn commit(&mut self, column: usize) -> Result<(), CommitError> {
        self.port.commit(column)
    }

    /// Events since the last call.
    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        mem::take(&mut self.events)
    }

    #[must_use]
    pub fn entities(&self) -> Vec<&AnimatedEntity> {
        self.mirror.iter()
    }

    #[must_use]
    pub fn mirror(&self) -> &MirrorStore {
        &self.mirror
    }

    /// The phase the scene is animating, once the first snapshot is in.
    #[must_use]
    pub fn phase(&self) -> Option<GlobalPhase> {
        self.orchestrator.phase()
    }

    /// Nothing is moving and the board is waiting for a move.
    ///
    /// A STATIC request alone is not enough: the domain may still answer it
    /// with another collapse.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.orchestrator.is_resting()
            && !self.mirror.is_animating()
            && self.throttle.is_idle()
            && !matches!(self.snapshots.has_changed(), Ok(true))
    }

    #[must_use]
    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    #[must_use]
    pub fn clock(&self) -> Duration {
        self.clock
    }

    #[must_use]
    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}
