use std::ops::{Add, AddAssign, Mul, Sub};

use serde::Deserialize;

/// World coordinates are pixels with y growing downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` for a zero or non-finite vector.
    pub fn normalized(self) -> Option<Vec2> {
        let length = self.length();
        if !length.is_finite() || length <= f32::EPSILON {
            return None;
        }
        Some(Vec2 {
            x: self.x / length,
            y: self.y / length,
        })
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Size {
    pub w: f32,
    pub h: f32,
}

impl Size {
    pub const fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }
}

/// Inset between a sprite's drawn rectangle and its collision box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub const NONE: Self = Self::uniform(0.0);

    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(inset: f32) -> Self {
        Self::new(inset, inset, inset, inset)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub origin: Vec2,
    pub size: Size,
}

impl BoundingBox {
    pub fn new(origin: Vec2, size: Size) -> Self {
        Self { origin, size }
    }

    /// Collision box for a sprite drawn at `origin` with the given padding.
    pub fn padded(origin: Vec2, size: Size, padding: Padding) -> Self {
        Self {
            origin: Vec2::new(origin.x + padding.left, origin.y + padding.top),
            size: Size::new(
                (size.w - padding.left - padding.right).max(0.0),
                (size.h - padding.top - padding.bottom).max(0.0),
            ),
        }
    }

    pub fn left(&self) -> f32 {
        self.origin.x
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.w
    }

    pub fn top(&self) -> f32 {
        self.origin.y
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.origin.x + self.size.w * 0.5,
            self.origin.y + self.size.h * 0.5,
        )
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            origin: self.origin + delta,
            size: self.size,
        }
    }

    /// Strict overlap; boxes that only share an edge do not collide.
    pub fn collides(&self, other: &BoundingBox) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}
