//! Fixed-capacity sliding window of per-corner incident weight

use std::collections::VecDeque;

/// Per-corner incident weight sums over the most recent corners.
///
/// The running weight sum is maintained on push and eviction so
/// recomputation never walks the window.
#[derive(Debug, Clone)]
pub struct IncidentWindow {
    entries: VecDeque<u32>,
    capacity: usize,
    weight_sum: u64,
}

impl IncidentWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity), capacity, weight_sum: 0 }
    }

    /// Append one corner's weight, evicting the oldest entry at capacity.
    pub fn push(&mut self, weight: u32) {
        while self.entries.len() >= self.capacity {
            match self.entries.pop_front() {
                Some(evicted) => self.weight_sum -= u64::from(evicted),
                None => break,
            }
        }
        self.entries.push_back(weight);
        self.weight_sum += u64::from(weight);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn weight_sum(&self) -> u64 {
        self.weight_sum
    }

    /// Mean weight per corner, 0.0 for an empty window.
    pub fn average_weight(&self) -> f64 {
        if self.entries.is_empty() {
            0.0
        } else {
            self.weight_sum as f64 / self.entries.len() as f64
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut window = IncidentWindow::with_capacity(3);
        for weight in [4, 0, 1, 2] {
            window.push(weight);
        }

        assert_eq!(window.len(), 3);
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(window.weight_sum(), 3);
        assert_eq!(window.average_weight(), 1.0);
    }

    #[test]
    fn empty_window_average_is_zero() {
        let window = IncidentWindow::with_capacity(100);
        assert!(window.is_empty());
        assert_eq!(window.average_weight(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_running_sum_matches_contents(
            capacity in 1usize..20,
            weights in prop::collection::vec(0u32..9, 0..60),
        ) {
            let mut window = IncidentWindow::with_capacity(capacity);
            for weight in weights {
                window.push(weight);
                prop_assert!(window.len() <= capacity);
                prop_assert_eq!(window.weight_sum(), window.iter().map(u64::from).sum::<u64>());
            }
        }
    }
}
