//! # Coordinate Store
//!
//! Bounded FIFO history of recent fixes, shared between the serial reader
//! and the HTTP handlers.
//!
//! All access goes through one mutex around a fixed-capacity ring buffer.
//! Pushing at capacity evicts the oldest fix, so the length never exceeds
//! the capacity, including transiently. The lock is never held across an
//! `.await` and poisoning is ignored, so store operations cannot fail.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::coordinate::Coordinate;

/// Default number of fixes retained
pub const DEFAULT_CAPACITY: usize = 100;

/// Thread-safe bounded history of fixes, oldest first
#[derive(Debug)]
pub struct CoordinateStore {
    fixes: Mutex<VecDeque<Coordinate>>,
    capacity: usize,
}

impl CoordinateStore {
    /// Create an empty store holding at most `capacity` fixes (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            fixes: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a fix, evicting the oldest one when full
    pub fn push(&self, coordinate: Coordinate) {
        let mut fixes = self.lock();
        if fixes.len() == self.capacity {
            fixes.pop_front();
        }
        fixes.push_back(coordinate);
    }

    /// Independent copy of all fixes in arrival order
    pub fn snapshot(&self) -> Vec<Coordinate> {
        self.lock().iter().copied().collect()
    }

    /// Most recently pushed fix, if any
    pub fn latest(&self) -> Option<Coordinate> {
        self.lock().back().copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Coordinate>> {
        // A panic elsewhere cannot leave a half-applied push behind
        self.fixes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CoordinateStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
