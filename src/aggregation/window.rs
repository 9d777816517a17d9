use std::collections::VecDeque;

/// Fixed-capacity FIFO buffer of recent per-instant observations.
///
/// Length never exceeds `capacity`; pushing into a full window evicts the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> SlidingWindow<T> {
    /// Panics if `capacity` is zero; window sizes come from validated config.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sliding window capacity must be >= 1");
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, returning the evicted one when the window was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.buf.len() == self.capacity {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(value);
        debug_assert!(self.buf.len() <= self.capacity);
        evicted
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// Oldest-first iteration.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.buf.iter()
    }

    /// The newest `n` entries (fewer if the window holds less), oldest first.
    pub fn trailing(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.buf.len().saturating_sub(n);
        self.buf.iter().skip(skip)
    }
}

impl SlidingWindow<f64> {
    /// Unweighted mean of the newest `n` entries, `None` when empty.
    pub fn trailing_mean(&self, n: usize) -> Option<f64> {
        let take = n.min(self.buf.len());
        if take == 0 {
            return None;
        }
        let sum: f64 = self.trailing(take).sum();
        Some(sum / take as f64)
    }

    /// Mean over the whole occupied window.
    pub fn mean(&self) -> Option<f64> {
        self.trailing_mean(self.buf.len())
    }
}

impl SlidingWindow<bool> {
    /// Share of occupied slots that are `true`; divides by occupancy, not capacity.
    pub fn ratio(&self) -> Option<f64> {
        if self.buf.is_empty() {
            return None;
        }
        let hits = self.buf.iter().filter(|flag| **flag).count();
        Some(hits as f64 / self.buf.len() as f64)
    }

    /// Share of `true` among the newest `n` slots.
    pub fn trailing_ratio(&self, n: usize) -> Option<f64> {
        let take = n.min(self.buf.len());
        if take == 0 {
            return None;
        }
        let hits = self.trailing(take).filter(|flag| **flag).count();
        Some(hits as f64 / take as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest_first() {
        let mut window = SlidingWindow::new(3);
        assert_eq!(window.push(1), None);
        assert_eq!(window.push(2), None);
        assert_eq!(window.push(3), None);
        assert_eq!(window.push(4), Some(1));
        let contents: Vec<i32> = window.iter().copied().collect();
        assert_eq!(contents, vec![2, 3, 4]);
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        let mut window = SlidingWindow::new(10);
        for i in 0..=10 {
            window.push(i);
            assert!(window.len() <= window.capacity());
        }
        assert!(window.is_full());
        assert_eq!(window.iter().next(), Some(&1));
        assert_eq!(window.iter().last(), Some(&10));
    }

    #[test]
    fn test_trailing_mean_uses_newest_entries() {
        let mut window = SlidingWindow::new(5);
        for v in [0.0, 0.0, 1.0, 1.0, 0.5] {
            window.push(v);
        }
        assert!((window.trailing_mean(2).unwrap() - 0.75).abs() < 1e-12);
        assert!((window.mean().unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_trailing_mean_before_fill() {
        let mut window = SlidingWindow::new(5);
        window.push(0.4);
        assert!((window.trailing_mean(2).unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_empty_window_reports_no_data() {
        let window: SlidingWindow<f64> = SlidingWindow::new(4);
        assert_eq!(window.mean(), None);
        let flags: SlidingWindow<bool> = SlidingWindow::new(4);
        assert_eq!(flags.ratio(), None);
    }

    #[test]
    fn test_ratio_divides_by_occupancy() {
        let mut flags = SlidingWindow::new(10);
        flags.push(true);
        flags.push(false);
        assert!((flags.ratio().unwrap() - 0.5).abs() < 1e-12);
        assert!((flags.trailing_ratio(1).unwrap() - 0.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_rejected() {
        let _ = SlidingWindow::<u8>::new(0);
    }
}
