use crate::Sample;
use std::collections::VecDeque;

/// Fixed-capacity FIFO that evicts the oldest entry once full.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

/// Retained camera samples, oldest first
pub type SampleBuffer = RingBuffer<Sample>;

/// Raw brightness history used for placement feedback
pub type BrightnessWindow = RingBuffer<f32>;

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `item`, returning whatever fell off the front.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }
}

impl<T: Clone> RingBuffer<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl SampleBuffer {
    pub fn values(&self) -> Vec<f32> {
        self.items.iter().map(|s| s.value).collect()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.items.iter().map(|s| s.timestamp).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_most_recent_samples_in_order() {
        let mut buffer = SampleBuffer::new(300);
        for i in 0..310 {
            buffer.push(Sample::new(i as f32 / 1000.0, i));
        }

        assert_eq!(buffer.len(), 300);
        let timestamps = buffer.timestamps();
        let expected: Vec<i64> = (10..310).collect();
        assert_eq!(timestamps, expected);
        assert_eq!(buffer.values()[0], 10.0 / 1000.0);
    }

    #[test]
    fn push_reports_evicted_item() {
        let mut window = BrightnessWindow::new(2);
        assert_eq!(window.push(0.1), None);
        assert_eq!(window.push(0.2), None);
        assert!(window.is_full());
        assert_eq!(window.push(0.3), Some(0.1));
        assert_eq!(window.to_vec(), vec![0.2, 0.3]);
    }

    #[test]
    fn zero_capacity_never_retains() {
        let mut window = BrightnessWindow::new(0);
        assert_eq!(window.push(0.4), Some(0.4));
        assert!(window.is_empty());
    }
}
