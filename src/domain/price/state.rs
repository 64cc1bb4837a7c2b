//! Rolling price series buffer.

use super::PricePoint;
use std::collections::VecDeque;

/// Maximum number of points kept on the chart.
pub const SERIES_CAPACITY: usize = 500;

/// Chronologically ordered, capacity-bounded price series.
///
/// Oldest points are dropped from the front so the buffer always holds the
/// most recent `capacity` points.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesBuffer {
    points: VecDeque<PricePoint>,
    capacity: usize,
}

impl Default for SeriesBuffer {
    fn default() -> Self {
        Self::new(SERIES_CAPACITY)
    }
}

impl SeriesBuffer {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, evicting and returning the oldest if at capacity.
    pub fn push(&mut self, point: PricePoint) -> Option<PricePoint> {
        let evicted = if self.points.len() >= self.capacity {
            self.points.pop_front()
        } else {
            None
        };
        self.points.push_back(point);
        evicted
    }

    /// Replace the whole series, keeping only the newest `capacity` points.
    pub fn replace(&mut self, points: Vec<PricePoint>) {
        let skip = points.len().saturating_sub(self.capacity);
        self.points.clear();
        self.points.extend(points.into_iter().skip(skip));
    }

    pub fn points(&self) -> &VecDeque<PricePoint> {
        &self.points
    }

    pub fn to_vec(&self) -> Vec<PricePoint> {
        self.points.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.back()
    }

    /// The two newest values as `(previous, latest)`.
    pub fn last_pair(&self) -> Option<(f64, f64)> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        Some((self.points[n - 2].value, self.points[n - 1].value))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
