//! Waypoint polylines that chains travel along
//!
//! Index 0 is the source end, the last index is the sink end. Chain traversal
//! never wraps, but arc-length queries treat the sequence as a loop so fixtures
//! can be ordered on the same path.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::closest_point_on_segment;
use crate::consts::MIN_WAYPOINT_SPACING;

/// Nearest point on a path to some position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Index of the segment start (the segment runs to `segment + 1`)
    pub segment: usize,
    /// Closest point on that segment
    pub point: Vec2,
    /// Distance from the queried position to `point`
    pub distance: f32,
}

/// An ordered polyline of waypoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Vec2>,
}

impl Path {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Build a path, dropping points too close to their predecessor
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Vec2>,
    {
        let mut path = Self::new();
        for point in points {
            path.append(point);
        }
        path
    }

    /// Add a waypoint if it is far enough from the last one.
    /// Returns whether the point was kept.
    pub fn append(&mut self, point: Vec2) -> bool {
        let keep = match self.points.last() {
            None => true,
            Some(last) => last.distance(point) > MIN_WAYPOINT_SPACING,
        };
        if keep {
            self.points.push(point);
        }
        keep
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<Vec2> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the sink-end waypoint
    pub fn last_index(&self) -> Option<usize> {
        self.points.len().checked_sub(1)
    }

    pub fn first(&self) -> Option<Vec2> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Vec2> {
        self.points.last().copied()
    }

    /// Vector from waypoint `segment` to `segment + 1`
    pub fn segment_vector(&self, segment: usize) -> Option<Vec2> {
        let a = self.point(segment)?;
        let b = self.point(segment + 1)?;
        Some(b - a)
    }

    /// Project `pos` onto every segment and return the closest hit.
    /// Ties keep the earliest segment.
    pub fn project(&self, pos: Vec2) -> Option<Projection> {
        let mut best: Option<Projection> = None;
        for (i, pair) in self.points.windows(2).enumerate() {
            let Some((point, _)) = closest_point_on_segment(pair[0], pair[1], pos) else {
                continue;
            };
            let distance = point.distance(pos);
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(Projection {
                    segment: i,
                    point,
                    distance,
                });
            }
        }
        best
    }

    /// Sum of segment lengths from `min(i, j)` to `max(i, j)`.
    ///
    /// Indices are taken modulo the path length, and the walk wraps from the
    /// last waypoint back to the first.
    pub fn arc_length_between(&self, i: usize, j: usize) -> f32 {
        let n = self.points.len();
        if n == 0 {
            return 0.0;
        }
        let (mut index, end) = {
            let (i, j) = (i % n, j % n);
            (i.min(j), i.max(j))
        };

        let mut length = 0.0;
        while index != end {
            let next = (index + 1) % n;
            length += self.points[index].distance(self.points[next]);
            index = next;
        }
        length
    }

    /// Arc length from waypoint `goal` to the projection of `pos` onto the path.
    ///
    /// The residual is measured from whichever end of the projected segment
    /// faces `goal`. Returns `f32::INFINITY` for a path without segments.
    pub fn distance_from_index_to_position(&self, goal: usize, pos: Vec2) -> f32 {
        let Some(projection) = self.project(pos) else {
            return f32::INFINITY;
        };
        let goal = goal % self.points.len();

        let anchor = if goal <= projection.segment {
            projection.segment
        } else {
            projection.segment + 1
        };

        self.arc_length_between(goal, anchor) + projection.point.distance(self.points[anchor])
    }

    /// Arc length from `pos` to the sink end of the path
    pub fn distance_to_sink(&self, pos: Vec2) -> f32 {
        match self.last_index() {
            Some(last) => self.distance_from_index_to_position(last, pos),
            None => f32::INFINITY,
        }
    }

    /// Total length of the polyline, without wrapping
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Distance along the polyline from the source end to the projection of `pos`
    pub fn arc_position(&self, pos: Vec2) -> Option<f32> {
        let projection = self.project(pos)?;
        let before: f32 = self.points[..=projection.segment]
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum();
        Some(before + self.points[projection.segment].distance(projection.point))
    }

    /// The point `arc` along the polyline and the segment it lies on.
    ///
    /// Clamped to the ends of the path; `None` without a segment.
    pub fn point_at(&self, arc: f32) -> Option<(Vec2, usize)> {
        let segments = self.points.len().checked_sub(1).filter(|&n| n > 0)?;
        let mut remaining = arc.max(0.0);
        for (i, pair) in self.points.windows(2).enumerate() {
            let length = pair[0].distance(pair[1]);
            if remaining <= length || i + 1 == segments {
                let t = if length > f32::EPSILON {
                    (remaining / length).min(1.0)
                } else {
                    0.0
                };
                return Some((pair[0].lerp(pair[1], t), i));
            }
            remaining -= length;
        }
        None
    }
}
