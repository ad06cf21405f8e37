use std::collections::VecDeque;

/// Fixed-capacity history that drops the oldest entry when pushing into a
/// full buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// A zero capacity is bumped to one so the newest entry is always kept.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.data.len() >= self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.data.iter()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn front(&self) -> Option<&T> {
        self.data.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.data.back()
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.data.pop_front()
    }

    /// Drops entries from the front, oldest first, while `is_expired` holds.
    pub fn drop_front_while<F: Fn(&T) -> bool>(&mut self, is_expired: F) {
        while self.data.front().is_some_and(&is_expired) {
            self.data.pop_front();
        }
    }
}
