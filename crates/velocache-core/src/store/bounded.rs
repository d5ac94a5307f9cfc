//! Newest-first bounded buffer.

use std::collections::VecDeque;

/// A prepend-only buffer that keeps at most `cap` items, newest first.
///
/// Backs the flow and log views: high-frequency append-only streams where
/// only the most recent items matter and memory must stay bounded.
#[derive(Debug, Clone)]
pub struct BoundedBuffer<T> {
    items: VecDeque<T>,
    cap: usize,
}

impl<T> BoundedBuffer<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Prepend an item; the oldest item is dropped once over capacity.
    pub fn push(&mut self, item: T) {
        self.items.push_front(item);
        self.items.truncate(self.cap);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Newest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// The most recently pushed item.
    pub fn newest(&self) -> Option<&T> {
        self.items.front()
    }
}

impl<'a, T> IntoIterator for &'a BoundedBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn keeps_newest_first() {
        let mut buf = BoundedBuffer::new(3);
        buf.push(1);
        buf.push(2);
        buf.push(3);

        assert_eq!(buf.iter().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(buf.newest(), Some(&3));
    }

    #[test]
    fn overflow_drops_the_oldest() {
        let mut buf = BoundedBuffer::new(100);
        for i in 0..101 {
            buf.push(i);
        }

        assert_eq!(buf.len(), 100);
        // The very first item is gone, the rest are in arrival order.
        assert_eq!(buf.newest(), Some(&100));
        assert!(!buf.iter().any(|&i| i == 0));
        assert_eq!(buf.iter().last(), Some(&1));
    }
}
