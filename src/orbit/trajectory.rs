//! Bounded trajectory history.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::orbit::units::Vector3;

/// Default number of samples retained per body.
pub const DEFAULT_TRAJECTORY_CAPACITY: usize = 1000;

/// Recorded position at a point in simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Simulated time (s).
    pub time: f64,
    /// Position (m).
    pub position: Vector3,
}

/// Fixed-capacity FIFO of trajectory samples; the oldest sample is
/// evicted once full.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    samples: VecDeque<TrajectorySample>,
    capacity: usize,
}

impl Trajectory {
    /// Create an empty trajectory holding at most `capacity` samples.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when at capacity.
    pub fn record(&mut self, time: f64, position: Vector3) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(TrajectorySample { time, position });
    }

    /// Number of stored samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-first iterator over samples.
    pub fn iter(&self) -> impl Iterator<Item = &TrajectorySample> {
        self.samples.iter()
    }

    /// Most recent sample.
    #[must_use]
    pub fn latest(&self) -> Option<&TrajectorySample> {
        self.samples.back()
    }

    /// Copy samples out, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<TrajectorySample> {
        self.samples.iter().copied().collect()
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for Trajectory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TRAJECTORY_CAPACITY)
    }
}
