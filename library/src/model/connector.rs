//! Wires between an output port and an input port.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::math::{Rect, Vector2};
use crate::model::port::PortId;

/// A directed wire. `start` is always the output side, `end` the input side.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Connector {
    pub uid: Uuid,
    pub start: PortId,
    pub end: PortId,
    #[serde(skip)]
    pub selected: bool,
    #[serde(skip)]
    pub hover: bool,
}

impl Connector {
    pub fn new(start: PortId, end: PortId) -> Self {
        Self::with_uid(Uuid::new_v4(), start, end)
    }

    pub fn with_uid(uid: Uuid, start: PortId, end: PortId) -> Self {
        Self {
            uid,
            start,
            end,
            selected: false,
            hover: false,
        }
    }

    pub fn touches_block(&self, block_id: &Uuid) -> bool {
        &self.start.block_id == block_id || &self.end.block_id == block_id
    }

    pub fn is_between(&self, start: &PortId, end: &PortId) -> bool {
        &self.start == start && &self.end == end
    }
}

const MIN_HANDLE: f32 = 20.0;

/// Cubic curve drawn for a wire: it leaves the output port to the right and
/// enters the input port from the left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectorCurve {
    pub start: Vector2,
    pub end: Vector2,
}

impl ConnectorCurve {
    pub fn new(start: Vector2, end: Vector2) -> Self {
        Self { start, end }
    }

    pub fn control_points(&self) -> [Vector2; 4] {
        let handle = ((self.end.x - self.start.x).abs() * 0.5).max(MIN_HANDLE);
        [
            self.start,
            Vector2::new(self.start.x + handle, self.start.y),
            Vector2::new(self.end.x - handle, self.end.y),
            self.end,
        ]
    }

    pub fn point_at(&self, t: f32) -> Vector2 {
        let [p0, p1, p2, p3] = self.control_points();
        let u = 1.0 - t;
        p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
    }

    /// Region used for the spatial index: the control polygon's bounds grown
    /// by `padding`. The curve never leaves its control polygon.
    pub fn bounds(&self, padding: f32) -> Rect {
        let points = self.control_points();
        let mut min = points[0];
        let mut max = points[0];
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Rect::from_two_points(min, max).expanded(padding)
    }

    /// Distance from `point` to the curve, approximated by `samples` segments.
    pub fn distance_to(&self, point: Vector2, samples: usize) -> f32 {
        let samples = samples.max(1);
        let mut prev = self.start;
        let mut best = f32::MAX;
        for i in 1..=samples {
            let next = self.point_at(i as f32 / samples as f32);
            best = best.min(distance_to_segment(point, prev, next));
            prev = next;
        }
        best
    }

    pub fn hit_test(&self, point: Vector2, tolerance: f32, samples: usize) -> bool {
        self.bounds(tolerance).contains_point(point) && self.distance_to(point, samples) <= tolerance
    }
}

pub fn distance_to_segment(point: Vector2, a: Vector2, b: Vector2) -> f32 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return point.distance(a);
    }
    let ap = point - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_distance() {
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Vector2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Vector2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Vector2::new(1.0, 1.0), a, a), 2f32.sqrt());
    }

    #[test]
    fn test_straight_curve_hit() {
        let curve = ConnectorCurve::new(Vector2::new(0.0, 0.0), Vector2::new(200.0, 0.0));
        assert!(curve.hit_test(Vector2::new(100.0, 2.0), 5.0, 24));
        assert!(!curve.hit_test(Vector2::new(100.0, 20.0), 5.0, 24));
    }

    #[test]
    fn test_bounds_cover_curve() {
        let curve = ConnectorCurve::new(Vector2::new(0.0, 0.0), Vector2::new(100.0, 80.0));
        let bounds = curve.bounds(0.0);
        for i in 0..=10 {
            let p = curve.point_at(i as f32 / 10.0);
            assert!(bounds.contains_point(p), "{} outside {}", p, bounds);
        }
    }

    #[test]
    fn test_curve_bulge_is_not_bounding_box() {
        // an S-curve: the bbox corner is far from the wire
        let curve = ConnectorCurve::new(Vector2::new(0.0, 0.0), Vector2::new(200.0, 200.0));
        let corner = Vector2::new(195.0, 5.0);
        assert!(curve.bounds(5.0).contains_point(corner));
        assert!(!curve.hit_test(corner, 5.0, 24));
    }
}
