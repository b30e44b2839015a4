//! Fixed-capacity ring buffers that overwrite the oldest element when full.

use parking_lot::RwLock;

/// Ring buffer with a monotonically increasing write sequence.
///
/// Slots are addressed relative to the sequence: once the buffer is full,
/// `get(0)` is the oldest element and `get(-1)` the newest. Slots that have
/// never been written yield `None`.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    seq: u64,
    data: Vec<Option<T>>,
}

impl<T> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            seq: 0,
            data: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Append an element. If the buffer is full, the oldest element is
    /// overwritten.
    pub fn push(&mut self, value: T) {
        let capacity = self.data.len() as u64;
        let slot = (self.seq % capacity) as usize;
        self.data[slot] = Some(value);
        self.seq += 1;
    }

    /// Element at a ring position relative to the sequence. Negative
    /// indices count from the end, so `get(-1)` is the most recent write.
    /// Out-of-range indices and never-written slots yield `None`.
    pub fn get(&self, index: i64) -> Option<&T> {
        let capacity = self.data.len() as i64;
        let index = if index < 0 { capacity + index } else { index };
        if index < 0 || index >= capacity {
            return None;
        }
        let slot = ((self.seq + index as u64) % capacity as u64) as usize;
        self.data[slot].as_ref()
    }

    /// The most recent write, if any.
    pub fn latest(&self) -> Option<&T> {
        if self.seq == 0 {
            return None;
        }
        self.get(-1)
    }

    /// Number of occupied slots, between zero and the capacity.
    pub fn len(&self) -> usize {
        let capacity = self.data.len() as u64;
        if self.seq < capacity {
            self.seq as usize
        } else {
            capacity as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seq == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Copy of the contents in insertion order.
    pub fn flatten(&self) -> Vec<T>
    where
        T: Clone,
    {
        let capacity = self.data.len() as u64;
        if self.seq < capacity {
            return self.data[..self.seq as usize]
                .iter()
                .filter_map(Clone::clone)
                .collect();
        }

        let sep = (self.seq % capacity) as usize;
        let mut out = Vec::with_capacity(capacity as usize);
        out.extend(self.data[sep..].iter().filter_map(Clone::clone));
        out.extend(self.data[..sep].iter().filter_map(Clone::clone));
        out
    }
}

/// Thread-safe wrapper over [`RingBuffer`] with `&self` methods.
pub struct SharedRingBuffer<T> {
    inner: RwLock<RingBuffer<T>>,
}

impl<T> SharedRingBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(RingBuffer::with_capacity(capacity)),
        }
    }

    pub fn push(&self, value: T) {
        self.inner.write().push(value);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    pub fn latest(&self) -> Option<T>
    where
        T: Clone,
    {
        self.inner.read().latest().cloned()
    }

    pub fn flatten(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.inner.read().flatten()
    }

    /// Independent copy of the underlying buffer.
    pub fn to_ring(&self) -> RingBuffer<T>
    where
        T: Clone,
    {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn partial_fill_keeps_insertion_order() {
        let mut ring = RingBuffer::with_capacity(4);
        ring.push(1);
        ring.push(2);

        assert_eq!(ring.len(), 2);
        assert!(!ring.is_empty());
        assert_eq!(ring.flatten(), vec![1, 2]);
        assert_eq!(ring.latest(), Some(&2));
    }

    #[test]
    fn full_buffer_overwrites_oldest() {
        let mut ring = RingBuffer::with_capacity(3);
        for n in 1..=5 {
            ring.push(n);
        }

        assert_eq!(ring.len(), 3);
        assert_eq!(ring.flatten(), vec![3, 4, 5]);
        assert_eq!(ring.get(0), Some(&3));
        assert_eq!(ring.get(-1), Some(&5));
        assert_eq!(ring.get(-2), Some(&4));
    }

    #[test]
    fn out_of_range_indices_are_none() {
        let mut ring = RingBuffer::with_capacity(2);
        ring.push("a");

        assert_eq!(ring.get(5), None);
        assert_eq!(ring.get(-5), None);
    }

    #[test]
    fn empty_buffer_has_no_latest() {
        let ring: RingBuffer<u8> = RingBuffer::with_capacity(2);
        assert!(ring.is_empty());
        assert_eq!(ring.latest(), None);
        assert!(ring.flatten().is_empty());
    }

    #[test]
    #[should_panic(expected = "capacity must be non-zero")]
    fn zero_capacity_panics() {
        let _ = RingBuffer::<u8>::with_capacity(0);
    }

    #[test]
    fn clone_is_independent() {
        let mut ring = RingBuffer::with_capacity(2);
        ring.push(1);
        let copy = ring.clone();
        ring.push(2);
        ring.push(3);

        assert_eq!(copy.flatten(), vec![1]);
        assert_eq!(ring.flatten(), vec![2, 3]);
    }

    #[test]
    fn to_ring_detaches_from_the_shared_buffer() {
        let shared = SharedRingBuffer::with_capacity(3);
        shared.push(1);
        shared.push(2);

        let copy = shared.to_ring();
        shared.push(3);
        shared.push(4);

        assert_eq!(copy.flatten(), vec![1, 2]);
        assert_eq!(shared.flatten(), vec![2, 3, 4]);
        assert_eq!(shared.latest(), Some(4));
    }

    #[test]
    fn shared_buffer_accepts_concurrent_writers() {
        let ring: Arc<SharedRingBuffer<usize>> = Arc::new(SharedRingBuffer::with_capacity(64));

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    for n in 0..8 {
                        ring.push(worker * 100 + n);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ring.len(), 32);
        assert_eq!(ring.flatten().len(), 32);
    }
}
