//! Axis-aligned rectangles on the ground plane
//!
//! All 2D positions in this crate are ground-plane coordinates: `Vec2::x` is
//! world X and `Vec2::y` is world Z.

use glam::Vec2;

/// Axis-aligned rectangle in ground-plane coordinates
///
/// Bounds are treated as closed on both sides, so two rectangles sharing an
/// edge both contain points lying on it. Callers that need a unique owner
/// resolve the tie themselves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Minimum corner (smallest x and z)
    pub min: Vec2,
    /// Maximum corner (largest x and z)
    pub max: Vec2,
}

impl Rect {
    /// Create a new rectangle from min and max corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Check if a point is inside the rectangle (edges included)
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Nearest point of the rectangle to `point`
    ///
    /// Non-finite components are replaced by the rectangle's center so the
    /// result is always a valid point inside the rectangle.
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        let center = self.center();
        let x = if point.x.is_finite() { point.x } else { center.x };
        let y = if point.y.is_finite() { point.y } else { center.y };
        Vec2::new(x.clamp(self.min.x, self.max.x), y.clamp(self.min.y, self.max.y))
    }

    /// Squared distance from `point` to the rectangle (zero inside)
    #[inline]
    pub fn distance_squared(&self, point: Vec2) -> f32 {
        let dx = (self.min.x - point.x).max(0.0).max(point.x - self.max.x);
        let dy = (self.min.y - point.y).max(0.0).max(point.y - self.max.y);
        dx * dx + dy * dy
    }

    /// Test intersection with a closed disk
    #[inline]
    pub fn intersects_disk(&self, center: Vec2, radius: f32) -> bool {
        self.distance_squared(center) <= radius * radius
    }

    /// Rectangle enclosing both rectangles
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}
