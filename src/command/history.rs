// HistoryStack - fixed capacity ring buffer used for undo and redo history
//
// Once full, a push overwrites the oldest entry. Undo depth beyond the capacity
// horizon is not recoverable; that is the memory bound on history.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default number of entries kept in each history stack
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Errors from [`HistoryStack`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("A history stack needs a capacity of at least one")]
    ZeroCapacity,

    #[error("History stacks only support removing the most recent entry")]
    RemoveUnsupported,
}

struct Ring<T> {
    slots: Vec<Option<T>>,
    /// Index of the most recent entry
    head: usize,
    len: usize,
}

impl<T> Ring<T> {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot indexes from newest to oldest
    fn newest_first(&self) -> impl Iterator<Item = usize> + '_ {
        let capacity = self.capacity();
        (0..self.len).map(move |offset| (self.head + capacity - offset) % capacity)
    }
}

/// Thread-safe bounded LIFO stack
///
/// All operations take the internal mutex, so a stack can be queried from a
/// thread that does not hold the editing session lock.
pub struct HistoryStack<T> {
    ring: Mutex<Ring<T>>,
}

impl<T> HistoryStack<T> {
    /// Create a stack holding at most `capacity` entries
    ///
    /// # Errors
    /// Returns [`HistoryError::ZeroCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, HistoryError> {
        if capacity == 0 {
            return Err(HistoryError::ZeroCapacity);
        }
        Ok(Self::with_slots(capacity))
    }

    /// `capacity` must be non-zero
    fn with_slots(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            ring: Mutex::new(Ring {
                slots,
                // the first push advances to slot 0
                head: capacity - 1,
                len: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push an entry, evicting the oldest one when the stack is full
    pub fn push(&self, item: T) {
        let mut ring = self.lock();
        let capacity = ring.capacity();
        ring.head = (ring.head + 1) % capacity;
        let head = ring.head;
        ring.slots[head] = Some(item);
        if ring.len < capacity {
            ring.len += 1;
        }
    }

    /// Pop the most recent entry
    pub fn try_pop(&self) -> Option<T> {
        let mut ring = self.lock();
        if ring.len == 0 {
            return None;
        }
        let capacity = ring.capacity();
        let head = ring.head;
        let item = ring.slots[head].take();
        ring.len -= 1;
        ring.head = (head + capacity - 1) % capacity;
        item
    }

    /// Run `f` against the most recent entry without removing it
    pub fn peek_with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let ring = self.lock();
        if ring.len == 0 {
            return None;
        }
        ring.slots[ring.head].as_ref().map(f)
    }

    pub fn clear(&self) {
        let mut ring = self.lock();
        for slot in ring.slots.iter_mut() {
            *slot = None;
        }
        ring.len = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Map every entry, newest first
    pub fn map_newest_first<R>(&self, mut f: impl FnMut(&T) -> R) -> Vec<R> {
        let ring = self.lock();
        ring.newest_first()
            .filter_map(|index| ring.slots[index].as_ref())
            .map(&mut f)
            .collect()
    }

    /// Arbitrary removal is not supported; history is strictly a stack
    ///
    /// # Errors
    /// Always returns [`HistoryError::RemoveUnsupported`].
    pub fn remove(&self, _item: &T) -> Result<T, HistoryError> {
        tracing::error!("attempted to remove an arbitrary entry from a history stack");
        Err(HistoryError::RemoveUnsupported)
    }
}

impl<T: Clone> HistoryStack<T> {
    /// Copy of every entry, newest first
    pub fn snapshot(&self) -> Vec<T> {
        self.map_newest_first(T::clone)
    }
}

impl<T: PartialEq> HistoryStack<T> {
    pub fn contains(&self, item: &T) -> bool {
        let ring = self.lock();
        ring.newest_first()
            .any(|index| ring.slots[index].as_ref() == Some(item))
    }
}

impl<T> Default for HistoryStack<T> {
    fn default() -> Self {
        Self::with_slots(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_lifo() {
        let stack = HistoryStack::new(4).unwrap();
        stack.push(1);
        stack.push(2);
        stack.push(3);

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.try_pop(), Some(3));
        assert_eq!(stack.try_pop(), Some(2));
        assert_eq!(stack.try_pop(), Some(1));
        assert_eq!(stack.try_pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_eviction_drops_exactly_the_oldest() {
        let stack = HistoryStack::new(3).unwrap();
        for i in 0..4 {
            stack.push(i);
        }

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.snapshot(), vec![3, 2, 1]);
        assert!(!stack.contains(&0));
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        let stack = HistoryStack::new(5).unwrap();
        for i in 0..23 {
            stack.push(i);
            assert!(stack.len() <= 5);
        }
        assert_eq!(stack.snapshot(), vec![22, 21, 20, 19, 18]);
    }

    #[test]
    fn test_pop_wraps_around_start() {
        let stack = HistoryStack::new(2).unwrap();
        stack.push('a');
        stack.push('b');
        stack.push('c');

        assert_eq!(stack.try_pop(), Some('c'));
        assert_eq!(stack.try_pop(), Some('b'));
        assert_eq!(stack.try_pop(), None);

        stack.push('d');
        assert_eq!(stack.snapshot(), vec!['d']);
    }

    #[test]
    fn test_interleaved_push_and_pop() {
        let stack = HistoryStack::new(3).unwrap();
        stack.push(1);
        stack.push(2);
        assert_eq!(stack.try_pop(), Some(2));
        stack.push(3);
        stack.push(4);
        stack.push(5);

        assert_eq!(stack.snapshot(), vec![5, 4, 3]);
        assert_eq!(stack.peek_with(|v| *v * 10), Some(50));
    }

    #[test]
    fn test_clear() {
        let stack = HistoryStack::new(3).unwrap();
        stack.push(1);
        stack.push(2);
        stack.clear();

        assert!(stack.is_empty());
        assert_eq!(stack.try_pop(), None);
        stack.push(7);
        assert_eq!(stack.snapshot(), vec![7]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            HistoryStack::<u8>::new(0).err(),
            Some(HistoryError::ZeroCapacity)
        );
    }

    #[test]
    fn test_default_capacity() {
        let stack = HistoryStack::default();
        assert_eq!(stack.capacity(), DEFAULT_HISTORY_CAPACITY);
        for i in 0..=DEFAULT_HISTORY_CAPACITY {
            stack.push(i);
        }
        assert_eq!(stack.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(stack.try_pop(), Some(DEFAULT_HISTORY_CAPACITY));
        assert!(!stack.contains(&0));
    }

    #[test]
    fn test_remove_is_unsupported() {
        let stack = HistoryStack::new(2).unwrap();
        stack.push(1);
        stack.push(2);

        assert_eq!(stack.remove(&1), Err(HistoryError::RemoveUnsupported));
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_concurrent_pushes_are_serialized() {
        use std::sync::Arc;
        use std::thread;

        let stack = Arc::new(HistoryStack::new(1000).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let stack = Arc::clone(&stack);
                thread::spawn(move || {
                    for i in 0..100 {
                        stack.push(t * 100 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stack.len(), 400);
    }
}
