use std::collections::VecDeque;

use nalgebra::Vector2;

use crate::error::{PendulumError, PendulumResult};

/// Points kept per pendulum unless configured otherwise.
pub const DEFAULT_TRAIL_CAPACITY: usize = 600;

/// Bounded history of end-effector positions, oldest evicted first.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<Vector2<f64>>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> PendulumResult<Self> {
        if capacity == 0 {
            return Err(PendulumError::InvalidTrailCapacity(capacity));
        }
        Ok(Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn push(&mut self, point: Vector2<f64>) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Points from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Vector2<f64>> + '_ {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&Vector2<f64>> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self {
            points: VecDeque::with_capacity(DEFAULT_TRAIL_CAPACITY),
            capacity: DEFAULT_TRAIL_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let mut trail = Trail::new(3).unwrap();
        for i in 0..5 {
            trail.push(Vector2::new(i as f64, 0.0));
        }
        assert_eq!(trail.len(), 3);
        let xs: Vec<f64> = trail.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
        assert_eq!(trail.latest().map(|p| p.x), Some(4.0));
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            Trail::new(0),
            Err(PendulumError::InvalidTrailCapacity(0))
        ));
    }

    #[test]
    fn default_capacity() {
        let trail = Trail::default();
        assert_eq!(trail.capacity(), DEFAULT_TRAIL_CAPACITY);
        assert!(trail.is_empty());
    }
}
