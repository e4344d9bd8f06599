use serde::{Deserialize, Serialize};

/// A position in abstract screen units. The renderer decides the unit size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation; `t` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn lerp(self, to: Point, t: f32) -> Point {
        let t = t.clamp(0.0, 1.0);
        Point {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}
