//! One visual block.

use std::time::Duration;

use tracing::debug;

use blockfall_types::{BlockId, BlockSnapshot, GlobalPhase, GridPos, PhaseKind, Point};

use crate::layout::BoardLayout;
use crate::motion::{Fade, Motion, Translate};

/// Where an entity is in its own animation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalPhase {
    Entering,
    Settled,
    Collapsing,
    Moving,
}

/// Transient visual left behind by a merge: the pre-merge value fading out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ghost {
    pub value: u32,
    pub opacity: f32,
}

/// Raised exactly once when an entity's phase motion finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub kind: PhaseKind,
    pub id: BlockId,
    /// The entity merged into another cell and must be removed.
    pub absorbed: bool,
}

#[derive(Debug, Clone)]
pub struct AnimatedEntity {
    id: BlockId,
    pos: GridPos,
    value: u32,
    target_value: Option<u32>,
    collapse_target: Option<GridPos>,
    move_target: Option<GridPos>,
    local_phase: LocalPhase,
    position: Point,
    /// Post-merge value shown once a collapse starts.
    shown_value: Option<u32>,
    motion: Option<Motion>,
    ghost: Option<Ghost>,
}

impl AnimatedEntity {
    /// A fresh entity at rest, or at the spawn point when it is entering.
    #[must_use]
    pub fn spawn(block: &BlockSnapshot, phase: GlobalPhase, layout: &BoardLayout) -> Self {
        let entering = block.entering && phase == GlobalPhase::Placing;
        let position = if entering {
            layout.spawn_point(block.pos.column)
        } else {
            layout.resting(block.pos)
        };
        Self {
            id: block.id,
            pos: block.pos,
            value: block.value,
            target_value: block.target_value,
            collapse_target: block.collapse_target,
            move_target: block.move_target,
            local_phase: if entering {
                LocalPhase::Entering
            } else {
                LocalPhase::Settled
            },
            position,
            shown_value: None,
            motion: None,
            ghost: None,
        }
    }

    /// Overwrite the mirrored fields. Never touches a running motion.
    pub fn apply(&mut self, block: &BlockSnapshot) {
        self.pos = block.pos;
        self.value = block.value;
        self.target_value = block.target_value;
        self.collapse_target = block.collapse_target;
        self.move_target = block.move_target;
    }

    /// Fly in from the spawn point. Only entering entities place.
    pub fn start_placement(&mut self, layout: &BoardLayout, duration: Duration) -> bool {
        if self.local_phase != LocalPhase::Entering || !self.can_start(PhaseKind::Placement) {
            return false;
        }
        let translate = Translate::new(self.position, layout.resting(self.pos), duration);
        self.motion = Some(Motion::new(PhaseKind::Placement, self.pos, translate));
        true
    }

    /// Slide into the collapse target while the pre-merge value fades out.
    /// A no-op without a collapse target.
    pub fn collapse(&mut self, layout: &BoardLayout, duration: Duration) -> bool {
        let Some(target) = self.collapse_target else {
            return false;
        };
        if !self.can_start(PhaseKind::Collapse) {
            return false;
        }
        self.ghost = Some(Ghost {
            value: self.display_value(),
            opacity: 1.0,
        });
        self.shown_value = Some(self.target_value.unwrap_or(self.value));
        let translate = Translate::new(self.position, layout.resting(target), duration);
        self.motion = Some(
            Motion::new(PhaseKind::Collapse, target, translate).with_fade(Fade::out(duration)),
        );
        self.local_phase = LocalPhase::Collapsing;
        true
    }

    /// Slide to the move target. A no-op without one.
    pub fn move_to_target(&mut self, layout: &BoardLayout, duration: Duration) -> bool {
        let Some(target) = self.move_target else {
            return false;
        };
        if !self.can_start(PhaseKind::Move) {
            return false;
        }
        let translate = Translate::new(self.position, layout.resting(target), duration);
        self.motion = Some(Motion::new(PhaseKind::Move, target, translate));
        self.local_phase = LocalPhase::Moving;
        true
    }

    fn can_start(&self, kind: PhaseKind) -> bool {
        match &self.motion {
            Some(running) => {
                debug!(
                    id = %self.id,
                    running = %running.kind(),
                    refused = %kind,
                    "Motion already in flight"
                );
                false
            }
            None => true,
        }
    }

    /// Step the running motion. Returns its completion on the frame it ends.
    pub fn advance(&mut self, delta: Duration) -> Option<Completion> {
        let motion = self.motion.as_mut()?;
        motion.advance(delta);
        self.position = motion.position();
        if let (Some(ghost), Some(opacity)) = (&mut self.ghost, motion.opacity()) {
            ghost.opacity = opacity;
        }
        if !motion.is_finished() {
            return None;
        }

        let motion = self.motion.take()?;
        self.position = motion.destination();
        self.local_phase = LocalPhase::Settled;
        let absorbed = match motion.kind() {
            PhaseKind::Collapse => {
                self.ghost = None;
                motion.target() != self.pos
            }
            PhaseKind::Placement | PhaseKind::Move => false,
        };
        Some(Completion {
            kind: motion.kind(),
            id: self.id,
            absorbed,
        })
    }

    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    #[must_use]
    pub fn pos(&self) -> GridPos {
        self.pos
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.value
    }

    #[must_use]
    pub fn target_value(&self) -> Option<u32> {
        self.target_value
    }

    #[must_use]
    pub fn collapse_target(&self) -> Option<GridPos> {
        self.collapse_target
    }

    #[must_use]
    pub fn move_target(&self) -> Option<GridPos> {
        self.move_target
    }

    #[must_use]
    pub fn local_phase(&self) -> LocalPhase {
        self.local_phase
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub fn resting_position(&self, layout: &BoardLayout) -> Point {
        layout.resting(self.pos)
    }

    /// The value drawn on the block.
    #[must_use]
    pub fn display_value(&self) -> u32 {
        self.shown_value.unwrap_or(self.value)
    }

    #[must_use]
    pub fn ghost(&self) -> Option<Ghost> {
        self.ghost
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.motion.is_some()
    }
}
