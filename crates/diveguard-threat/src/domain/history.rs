//! Fixed-capacity history ring.

/// Ring buffer of the `N` most recent values (array + write index).
///
/// Pushing into a full ring overwrites the oldest entry. Iteration runs from
/// oldest to newest.
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    slots: [Option<T>; N],
    /// Next slot to write
    head: usize,
    len: usize,
}

impl<T, const N: usize> RingBuffer<T, N> {
    /// Create an empty ring
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            head: 0,
            len: 0,
        }
    }

    /// Capacity of the ring
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been pushed
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when the next push evicts a value
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Append a value, returning the evicted oldest value when full.
    pub fn push(&mut self, value: T) -> Option<T> {
        if N == 0 {
            return Some(value);
        }
        let evicted = self.slots[self.head].replace(value);
        self.head = (self.head + 1) % N;
        if self.len < N {
            self.len += 1;
        }
        evicted
    }

    /// Most recently pushed value
    pub fn latest(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.slots[(self.head + N - 1) % N].as_ref()
    }

    /// Oldest retained value
    pub fn oldest(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.slots[(self.head + N - self.len) % N].as_ref()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let start = (self.head + N - self.len) % N.max(1);
        (0..self.len).filter_map(move |i| self.slots[(start + i) % N].as_ref())
    }

    /// Drop all values
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.head = 0;
        self.len = 0;
    }
}

impl<T, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
