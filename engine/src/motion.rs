//! Timed interpolations driven by frame deltas.
//!
//! Endpoints are captured when a motion starts and never change afterwards,
//! so updating an entity's fields mid-flight cannot retarget it.

use std::time::Duration;

use blockfall_types::{EffectTimer, GridPos, PhaseKind, Point};

#[must_use]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

#[derive(Debug, Clone)]
pub struct Translate {
    from: Point,
    to: Point,
    timer: EffectTimer,
}

impl Translate {
    #[must_use]
    pub fn new(from: Point, to: Point, duration: Duration) -> Self {
        Self {
            from,
            to,
            timer: EffectTimer::new(duration),
        }
    }

    pub fn advance(&mut self, delta: Duration) {
        self.timer.advance(delta);
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.from.lerp(self.to, ease_out_cubic(self.timer.progress()))
    }

    #[must_use]
    pub fn to(&self) -> Point {
        self.to
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.timer.is_finished()
    }
}

/// Opacity ramp from fully visible to invisible.
#[derive(Debug, Clone)]
pub struct Fade {
    timer: EffectTimer,
}

impl Fade {
    #[must_use]
    pub fn out(duration: Duration) -> Self {
        Self {
            timer: EffectTimer::new(duration),
        }
    }

    pub fn advance(&mut self, delta: Duration) {
        self.timer.advance(delta);
    }

    #[must_use]
    pub fn opacity(&self) -> f32 {
        1.0 - ease_out_cubic(self.timer.progress())
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.timer.is_finished()
    }
}

/// One phase motion of an entity: a translation, optionally joined with a fade.
///
/// A joined group finishes only once every track has finished.
#[derive(Debug, Clone)]
pub struct Motion {
    kind: PhaseKind,
    /// Cell the motion heads for.
    target: GridPos,
    translate: Translate,
    fade: Option<Fade>,
}

impl Motion {
    #[must_use]
    pub fn new(kind: PhaseKind, target: GridPos, translate: Translate) -> Self {
        Self {
            kind,
            target,
            translate,
            fade: None,
        }
    }

    #[must_use]
    pub fn with_fade(mut self, fade: Fade) -> Self {
        self.fade = Some(fade);
        self
    }

    #[must_use]
    pub fn kind(&self) -> PhaseKind {
        self.kind
    }

    #[must_use]
    pub fn target(&self) -> GridPos {
        self.target
    }

    pub fn advance(&mut self, delta: Duration) {
        self.translate.advance(delta);
        if let Some(fade) = &mut self.fade {
            fade.advance(delta);
        }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.translate.position()
    }

    #[must_use]
    pub fn destination(&self) -> Point {
        self.translate.to()
    }

    #[must_use]
    pub fn opacity(&self) -> Option<f32> {
        self.fade.as_ref().map(Fade::opacity)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.translate.is_finished() && self.fade.as_ref().is_none_or(Fade::is_finished)
    }
}
