//! Axis-aligned rectangles and the restricted rotation model
//!
//! Every hitbox in the engine is an axis-aligned rect in world units
//! (tile widths, y-up). Tiles may be rotated, but only by quarter turns;
//! `Rect::rotate_about` rotates just the two opposite corners and
//! bounding-boxes them, which is exact for quarter turns and deliberately
//! not a general rotated-hitbox model.

use glam::Vec2;
use thiserror::Error;

/// A rectangle produced a non-finite coordinate and was rejected from
/// collision use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rectangle contains a non-finite coordinate")]
pub struct InvalidGeometry;

/// Quarter-turn tile rotation. Arbitrary angles are rejected at level load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// Parse a rotation in degrees. Any multiple of 90 is normalized into
    /// [0, 360); everything else is refused.
    pub fn from_degrees(degrees: f32) -> Option<Self> {
        let normalized = degrees.rem_euclid(360.0);
        match normalized {
            d if d == 0.0 => Some(Rotation::R0),
            d if d == 90.0 => Some(Rotation::R90),
            d if d == 180.0 => Some(Rotation::R180),
            d if d == 270.0 => Some(Rotation::R270),
            _ => None,
        }
    }

    pub fn degrees(self) -> f32 {
        match self {
            Rotation::R0 => 0.0,
            Rotation::R90 => 90.0,
            Rotation::R180 => 180.0,
            Rotation::R270 => 270.0,
        }
    }

    /// Exact (cos, sin) pair, avoiding float trig drift at quarter turns
    fn cos_sin(self) -> (f32, f32) {
        match self {
            Rotation::R0 => (1.0, 0.0),
            Rotation::R90 => (0.0, 1.0),
            Rotation::R180 => (-1.0, 0.0),
            Rotation::R270 => (0.0, -1.0),
        }
    }

    /// Rotate a point about a pivot (clockwise in y-up coords)
    pub fn apply(self, pivot: Vec2, point: Vec2) -> Vec2 {
        let (cos, sin) = self.cos_sin();
        let d = point - pivot;
        Vec2::new(
            cos * d.x + sin * d.y + pivot.x,
            cos * d.y - sin * d.x + pivot.y,
        )
    }
}

/// An axis-aligned rectangle: bottom-left corner plus extents
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Open-interval AABB overlap test: touching edges do not collide
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Sub-rect at a fractional offset/size of this rect, e.g.
    /// `relative(0.1, 0.1, 0.8, 0.8)` is the 10%-inset interior.
    pub fn relative(&self, rx: f32, ry: f32, rw: f32, rh: f32) -> Rect {
        Rect::new(
            self.x + self.w * rx,
            self.y + self.h * ry,
            self.w * rw,
            self.h * rh,
        )
    }

    /// Bounding rect of two corner points
    pub fn from_points(a: Vec2, b: Vec2) -> Rect {
        Rect::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        )
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center_x(), self.center_y())
    }

    /// Rotate the bottom-left and top-right corners about `pivot` and
    /// return their bounding rect. Exact for the quarter turns `Rotation`
    /// permits; callers always pass the owning tile's center as the pivot.
    pub fn rotate_about(&self, rotation: Rotation, pivot: Vec2) -> Rect {
        let a = rotation.apply(pivot, Vec2::new(self.x, self.y));
        let b = rotation.apply(pivot, Vec2::new(self.x + self.w, self.y + self.h));
        Rect::from_points(a, b)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    /// Gate a rect before collision use. Non-finite rects can arise from
    /// edited level data; the caller degrades to "no interaction".
    pub fn require_finite(self) -> Result<Rect, InvalidGeometry> {
        if self.is_finite() { Ok(self) } else { Err(InvalidGeometry) }
    }
}
