//! Bounded recency windows
//!
//! Each window is a FIFO with a fixed capacity: pushing past capacity evicts
//! the oldest sample, so a window always holds the most recent N samples in
//! arrival order.

use crate::config::WindowCapacities;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fixed-capacity FIFO of recent samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedWindow<T> {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    ///
    /// Returns the evicted sample, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T> BoundedWindow<T> {
    /// Remove and return every sample, oldest first
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }
}

impl<T: Clone> BoundedWindow<T> {
    /// Copy of the samples from oldest to newest
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// A pointer position sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    /// Timestamp in milliseconds
    pub t: f64,
}

/// The five recency windows the feature extractor reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionWindow {
    /// Pointer positions
    pub pointer: BoundedWindow<PointerSample>,
    /// Click timestamps (ms)
    pub clicks: BoundedWindow<f64>,
    /// Scroll velocities (px/ms)
    pub scroll_velocity: BoundedWindow<f64>,
    /// Completed hover durations (ms)
    pub hover_durations: BoundedWindow<f64>,
    /// Keystroke timestamps (ms)
    pub keystrokes: BoundedWindow<f64>,
}

impl Default for InteractionWindow {
    fn default() -> Self {
        Self::new(&WindowCapacities::default())
    }
}

impl InteractionWindow {
    pub fn new(capacities: &WindowCapacities) -> Self {
        Self {
            pointer: BoundedWindow::new(capacities.pointer),
            clicks: BoundedWindow::new(capacities.clicks),
            scroll_velocity: BoundedWindow::new(capacities.scroll),
            hover_durations: BoundedWindow::new(capacities.hover),
            keystrokes: BoundedWindow::new(capacities.keystrokes),
        }
    }

    /// Total number of samples across all windows
    pub fn total_samples(&self) -> usize {
        self.pointer.len()
            + self.clicks.len()
            + self.scroll_velocity.len()
            + self.hover_durations.len()
            + self.keystrokes.len()
    }

    pub fn clear(&mut self) {
        self.pointer.clear();
        self.clicks.clear();
        self.scroll_velocity.clear();
        self.hover_durations.clear();
        self.keystrokes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_within_capacity() {
        let mut window = BoundedWindow::new(3);
        assert_eq!(window.push(1), None);
        assert_eq!(window.push(2), None);
        assert_eq!(window.len(), 2);
        assert_eq!(window.to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut window = BoundedWindow::new(3);
        for i in 0..3 {
            window.push(i);
        }
        assert_eq!(window.push(3), Some(0));
        assert_eq!(window.to_vec(), vec![1, 2, 3]);
        assert_eq!(window.first(), Some(&1));
        assert_eq!(window.last(), Some(&3));
    }

    #[test]
    fn test_never_exceeds_capacity_and_keeps_most_recent() {
        // Arbitrary push counts around and beyond each capacity
        for capacity in [1usize, 2, 5, 20, 50] {
            for pushes in [0usize, 1, capacity - 1, capacity, capacity + 1, capacity * 3 + 7] {
                let mut window = BoundedWindow::new(capacity);
                for i in 0..pushes {
                    window.push(i);
                    assert!(window.len() <= capacity);
                }
                let expected: Vec<usize> = (pushes.saturating_sub(capacity)..pushes).collect();
                assert_eq!(window.to_vec(), expected);
            }
        }
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut window = BoundedWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.push('a');
        window.push('b');
        assert_eq!(window.to_vec(), vec!['b']);
    }

    #[test]
    fn test_interaction_window_default_capacities() {
        let window = InteractionWindow::default();
        assert_eq!(window.pointer.capacity(), 50);
        assert_eq!(window.clicks.capacity(), 20);
        assert_eq!(window.scroll_velocity.capacity(), 20);
        assert_eq!(window.hover_durations.capacity(), 20);
        assert_eq!(window.keystrokes.capacity(), 30);
        assert_eq!(window.total_samples(), 0);
    }

    #[test]
    fn test_interaction_window_clear() {
        let mut window = InteractionWindow::default();
        window.clicks.push(10.0);
        window.keystrokes.push(20.0);
        assert_eq!(window.total_samples(), 2);

        window.clear();
        assert_eq!(window.total_samples(), 0);
        assert_eq!(window.clicks.capacity(), 20);
    }
}
