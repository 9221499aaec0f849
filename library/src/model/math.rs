//! 2D primitives shared by the graph model and the spatial index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn set(&mut self, x: f32, y: f32) -> &mut Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn set_from(&mut self, other: Vector2) -> &mut Self {
        self.set(other.x, other.y)
    }

    pub fn translate(&mut self, other: Vector2) -> &mut Self {
        self.x += other.x;
        self.y += other.y;
        self
    }

    pub fn subtract(&mut self, other: Vector2) -> &mut Self {
        self.x -= other.x;
        self.y -= other.y;
        self
    }

    pub fn multiply(&mut self, factor: f32) -> &mut Self {
        self.x *= factor;
        self.y *= factor;
        self
    }

    /// Division by zero leaves the vector untouched.
    pub fn divide(&mut self, divisor: f32) -> &mut Self {
        if divisor != 0.0 {
            self.x /= divisor;
            self.y /= divisor;
        }
        self
    }

    pub fn round(&mut self) -> &mut Self {
        self.x = self.x.round();
        self.y = self.y.round();
        self
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(&self, other: Vector2) -> f32 {
        (*self - other).length()
    }

    pub fn midpoint(&self, other: Vector2) -> Vector2 {
        Vector2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        self.translate(rhs);
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Vector2) {
        self.subtract(rhs);
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vector2 {
    type Output = Vector2;
    fn mul(self, rhs: f32) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangle. `w` and `h` may be negative, in which case the
/// rectangle extends left/up from `(x, y)`. Geometry must go through
/// `left`/`right`/`top`/`bottom`, never `x + w` directly.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
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

    pub fn from_pos_size(pos: Vector2, size: Vector2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    /// Normalized rect spanning two corner points given in any order.
    pub fn from_two_points(a: Vector2, b: Vector2) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn set(&mut self, x: f32, y: f32, w: f32, h: f32) -> &mut Self {
        self.x = x;
        self.y = y;
        self.w = w;
        self.h = h;
        self
    }

    pub fn set_pos(&mut self, pos: Vector2) -> &mut Self {
        self.x = pos.x;
        self.y = pos.y;
        self
    }

    pub fn set_size(&mut self, size: Vector2) -> &mut Self {
        self.w = size.x;
        self.h = size.y;
        self
    }

    pub fn left(&self) -> f32 {
        self.x.min(self.x + self.w)
    }

    pub fn right(&self) -> f32 {
        self.x.max(self.x + self.w)
    }

    pub fn top(&self) -> f32 {
        self.y.min(self.y + self.h)
    }

    pub fn bottom(&self) -> f32 {
        self.y.max(self.y + self.h)
    }

    pub fn width(&self) -> f32 {
        self.w.abs()
    }

    pub fn height(&self) -> f32 {
        self.h.abs()
    }

    pub fn pos(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vector2 {
        Vector2::new(self.w, self.h)
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Same area with non-negative width and height.
    pub fn normalized(&self) -> Rect {
        Rect::new(self.left(), self.top(), self.width(), self.height())
    }

    /// Edges are inclusive.
    pub fn contains_point(&self, point: Vector2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    /// Touching edges count as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        let a = self.center();
        let b = other.center();
        (a.x - b.x).abs() <= (self.width() + other.width()) / 2.0
            && (a.y - b.y).abs() <= (self.height() + other.height()) / 2.0
    }

    /// Smallest normalized rect covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Grows the normalized rect by `amount` on every side.
    pub fn expanded(&self, amount: f32) -> Rect {
        Rect::new(
            self.left() - amount,
            self.top() - amount,
            self.width() + amount * 2.0,
            self.height() + amount * 2.0,
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x, self.y, self.w, self.h)
    }
}

/// Pan and zoom of the editor canvas. Screen = (viewport - position) * scale.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub position: Vector2,
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            position: Vector2::ZERO,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn screen_to_viewport(&self, screen: Vector2) -> Vector2 {
        let scale = if self.scale == 0.0 { 1.0 } else { self.scale };
        Vector2::new(
            screen.x / scale + self.position.x,
            screen.y / scale + self.position.y,
        )
    }

    pub fn viewport_to_screen(&self, point: Vector2) -> Vector2 {
        (point - self.position) * self.scale
    }
}
