//! Sliding-window median filter used to de-jitter vision coordinates.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct MedianFilter {
    window: usize,
    buf: VecDeque<f64>,
    scratch: Vec<f64>,
}

impl MedianFilter {
    /// A window of 0 is treated as 1 (passthrough).
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            buf: VecDeque::with_capacity(window),
            scratch: Vec::with_capacity(window),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Push a sample and return the median of the samples currently held.
    pub fn calculate(&mut self, sample: f64) -> f64 {
        self.buf.push_back(sample);
        if self.buf.len() > self.window {
            self.buf.pop_front();
        }
        self.scratch.clear();
        self.scratch.extend(self.buf.iter().copied());
        self.scratch.sort_unstable_by(f64::total_cmp);
        let n = self.scratch.len();
        debug_assert!(n > 0 && n <= self.window);
        let mid = n / 2;
        if n.is_multiple_of(2) {
            (self.scratch[mid - 1] + self.scratch[mid]) / 2.0
        } else {
            self.scratch[mid]
        }
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }
}
