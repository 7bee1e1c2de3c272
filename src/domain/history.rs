// Rolling window of recent power samples
use super::power::PowerSample;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LEN: usize = 20;

/// Fixed-capacity FIFO of samples, oldest first.
#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<PowerSample>,
    capacity: usize,
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting from the front once full.
    pub fn push(&mut self, sample: PowerSample) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn latest(&self) -> Option<&PowerSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PowerSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn to_vec(&self) -> Vec<PowerSample> {
        self.samples.iter().cloned().collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_LEN)
    }
}
