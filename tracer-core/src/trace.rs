/// Default number of visual ticks kept per trace.
pub const DEFAULT_TRACE_CAPACITY: usize = 700;

/// Fixed-capacity FIFO of per-tick frequencies; `None` marks a gap.
///
/// Storage is allocated once; a write cursor overwrites the oldest entry
/// when full.
#[derive(Debug, Clone)]
pub struct TraceBuffer {
    slots: Vec<Option<f32>>,
    head: usize,
    len: usize,
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_TRACE_CAPACITY)
    }
}

impl TraceBuffer {
    /// Creates an empty buffer. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    /// Appends a value, evicting the oldest when full.
    pub fn push(&mut self, value: Option<f32>) {
        let capacity = self.slots.len();
        let index = (self.head + self.len) % capacity;
        self.slots[index] = value;
        if self.len < capacity {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % capacity;
        }
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<f32>> + '_ {
        let capacity = self.slots.len();
        (0..self.len).map(move |i| self.slots[(self.head + i) % capacity])
    }

    pub fn latest(&self) -> Option<f32> {
        if self.len == 0 {
            return None;
        }
        self.slots[(self.head + self.len - 1) % self.slots.len()]
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let mut trace = TraceBuffer::new(4);
        trace.push(Some(1.0));
        trace.push(None);
        trace.push(Some(3.0));
        assert_eq!(trace.iter().collect::<Vec<_>>(), vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(trace.latest(), Some(3.0));
    }

    #[test]
    fn evicts_oldest_on_overflow() {
        let mut trace = TraceBuffer::new(3);
        for i in 0..5 {
            trace.push(Some(i as f32));
        }
        assert_eq!(trace.len(), 3);
        assert_eq!(
            trace.iter().collect::<Vec<_>>(),
            vec![Some(2.0), Some(3.0), Some(4.0)]
        );
    }

    #[test]
    fn clear_empties_without_reallocating() {
        let mut trace = TraceBuffer::new(3);
        trace.push(Some(1.0));
        trace.clear();
        assert!(trace.is_empty());
        assert_eq!(trace.latest(), None);
        assert_eq!(trace.capacity(), 3);
    }
}
