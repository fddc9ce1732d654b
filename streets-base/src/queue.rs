/// A FIFO queue backed by a vec and a head index rather than a deque. Popping
/// advances the head instead of shifting elements, which keeps pop O(1) and
/// the storage contiguous. The backing storage is reclaimed whenever the
/// queue fully drains, so a queue reused across frames does not grow without
/// bound.
pub struct FifoQueue<T> {
    store: Vec<Option<T>>,
    head: usize,
}

impl<T> Default for FifoQueue<T> {
    fn default() -> Self {
        FifoQueue {
            store: Vec::default(),
            head: 0,
        }
    }
}

impl<T> FifoQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        FifoQueue {
            store: Vec::with_capacity(capacity),
            head: 0,
        }
    }

    pub fn push(
        &mut self,
        value: T,
    ) {
        self.store.push(Some(value));
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.head >= self.store.len() {
            return None;
        }

        let value = self.store[self.head].take();
        self.head += 1;

        // Everything before head is spent, drop the storage in one go
        if self.head == self.store.len() {
            self.store.clear();
            self.head = 0;
        }

        value
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len() - self.head
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::FifoQueue;

    #[test]
    fn pop_returns_fifo_order() {
        let mut queue = FifoQueue::default();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn interleaved_push_pop() {
        let mut queue = FifoQueue::default();
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.pop(), Some("a"));
        queue.push("c");
        assert_eq!(queue.pop(), Some("b"));
        assert_eq!(queue.pop(), Some("c"));
        assert!(queue.is_empty());
    }

    #[test]
    fn storage_reclaimed_on_drain() {
        let mut queue = FifoQueue::default();
        for i in 0..100 {
            queue.push(i);
        }
        for _ in 0..100 {
            queue.pop();
        }

        // Fully drained, so the next push starts over at index 0
        queue.push(0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some(0));
    }

    #[test]
    fn clear_empties_queue() {
        let mut queue = FifoQueue::default();
        queue.push(1);
        queue.push(2);
        queue.pop();
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }
}
