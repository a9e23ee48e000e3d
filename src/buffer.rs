/// A fixed-capacity circular buffer that keeps the most recent items.
///
/// Owned by a single stage; not shared between threads. A buffer with
/// capacity 0 holds nothing and hands every pushed item straight back.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    next: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with the specified capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            next: 0,
            len: 0,
        }
    }

    /// Push an item, returning the oldest item if it had to be evicted to make room
    pub fn push(&mut self, item: T) -> Option<T> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Some(item);
        }

        let evicted = self.slots[self.next].replace(item);
        self.next = (self.next + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
        evicted
    }

    /// Remove and return the oldest item
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        // Adding the capacity keeps the dividend non-negative
        let capacity = self.capacity();
        let first = (self.next + capacity - self.len) % capacity;
        self.len -= 1;
        self.slots[first].take()
    }

    /// Get the current number of buffered items
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if the next push will evict an item
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Get the capacity of the buffer
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Pop every buffered item, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.pop())
    }
}
