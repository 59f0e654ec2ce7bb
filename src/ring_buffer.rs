use thiserror::Error;

/// Error conditions for out-of-range ring buffer operations.
///
/// The frame loop sizes its buffers generously relative to the per-frame
/// sample count, so these are defensive assertions rather than expected
/// runtime paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingBufferError {
    #[error("buffer empty")]
    Empty,
    #[error("buffer full")]
    Full,
    #[error("index out of range")]
    OutOfRange,
}

/// A fixed-capacity circular queue.
///
/// Used to buffer pointer samples between the browser-style event cadence and
/// the per-frame tick: events arrive at an arbitrary rate and are consumed at
/// most once per displayed frame.
///
/// # Examples
///
/// ```
/// use impasto::RingBuffer;
///
/// let mut buffer = RingBuffer::new(4);
/// buffer.push_back(1).unwrap();
/// buffer.push_back(2).unwrap();
/// assert_eq!(buffer.pop_front(), Ok(1));
/// assert_eq!(buffer.len(), 1);
/// ```
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Creates a buffer holding at most `capacity` elements.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    fn slot(&self, offset: usize) -> usize {
        (self.head + offset) % self.slots.len()
    }

    /// Returns the element at `index`. Negative indices count back from the
    /// end, so `at(-1)` is the most recently pushed-back element.
    pub fn at(&self, index: isize) -> Result<&T, RingBufferError> {
        if index.unsigned_abs() >= self.len {
            return Err(RingBufferError::OutOfRange);
        }
        let offset = if index < 0 {
            self.len - index.unsigned_abs()
        } else {
            index as usize
        };
        self.slots[self.slot(offset)]
            .as_ref()
            .ok_or(RingBufferError::OutOfRange)
    }

    pub fn push_front(&mut self, element: T) -> Result<(), RingBufferError> {
        if self.is_full() {
            return Err(RingBufferError::Full);
        }
        self.head = (self.head + self.slots.len() - 1) % self.slots.len();
        self.slots[self.head] = Some(element);
        self.len += 1;
        Ok(())
    }

    pub fn push_back(&mut self, element: T) -> Result<(), RingBufferError> {
        if self.is_full() {
            return Err(RingBufferError::Full);
        }
        let slot = self.slot(self.len);
        self.slots[slot] = Some(element);
        self.len += 1;
        Ok(())
    }

    pub fn pop_front(&mut self) -> Result<T, RingBufferError> {
        if self.is_empty() {
            return Err(RingBufferError::Empty);
        }
        let element = self.slots[self.head].take().ok_or(RingBufferError::Empty)?;
        self.head = self.slot(1);
        self.len -= 1;
        Ok(element)
    }

    pub fn pop_back(&mut self) -> Result<T, RingBufferError> {
        if self.is_empty() {
            return Err(RingBufferError::Empty);
        }
        let slot = self.slot(self.len - 1);
        let element = self.slots[slot].take().ok_or(RingBufferError::Empty)?;
        self.len -= 1;
        Ok(element)
    }

    /// Drops all elements and resets the buffer to empty.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    /// Discards elements without returning them: a positive `count` drops
    /// from the front, a negative `count` drops from the back.
    pub fn shrink(&mut self, count: isize) -> Result<(), RingBufferError> {
        let dropped = count.unsigned_abs();
        if dropped > self.len {
            return Err(RingBufferError::OutOfRange);
        }
        for _ in 0..dropped {
            if count > 0 {
                self.pop_front()?;
            } else {
                self.pop_back()?;
            }
        }
        Ok(())
    }

    /// Iterates the buffered elements front to back without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).filter_map(move |offset| self.slots[self.slot(offset)].as_ref())
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copies the elements in `[start, end)` into a new vector. Negative
    /// bounds count back from the end, as with [`RingBuffer::at`].
    pub fn slice(&self, start: isize, end: isize) -> Result<Vec<T>, RingBufferError> {
        let resolve = |bound: isize| -> Result<usize, RingBufferError> {
            let resolved = if bound < 0 {
                self.len
                    .checked_sub(bound.unsigned_abs())
                    .ok_or(RingBufferError::OutOfRange)?
            } else {
                bound as usize
            };
            if resolved > self.len {
                return Err(RingBufferError::OutOfRange);
            }
            Ok(resolved)
        };

        let start = resolve(start)?;
        let end = resolve(end)?;
        if end < start {
            return Err(RingBufferError::OutOfRange);
        }

        let mut out = Vec::with_capacity(end - start);
        for offset in start..end {
            out.push(
                self.slots[self.slot(offset)]
                    .as_ref()
                    .ok_or(RingBufferError::OutOfRange)?
                    .clone(),
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_pop_preserve_order() {
        let mut buffer = RingBuffer::new(4);
        buffer.push_back(1).unwrap();
        buffer.push_back(2).unwrap();
        buffer.push_front(0).unwrap();
        assert_eq!(buffer.pop_front(), Ok(0));
        assert_eq!(buffer.pop_front(), Ok(1));
        assert_eq!(buffer.pop_back(), Ok(2));
        assert!(buffer.is_empty());
    }

    #[test]
    fn push_to_full_buffer_errors() {
        let mut buffer = RingBuffer::new(2);
        buffer.push_back(1).unwrap();
        buffer.push_back(2).unwrap();
        assert_eq!(buffer.push_back(3), Err(RingBufferError::Full));
        assert_eq!(buffer.push_front(0), Err(RingBufferError::Full));
    }

    #[test]
    fn pop_from_empty_buffer_errors() {
        let mut buffer: RingBuffer<u32> = RingBuffer::new(2);
        assert_eq!(buffer.pop_front(), Err(RingBufferError::Empty));
        assert_eq!(buffer.pop_back(), Err(RingBufferError::Empty));
    }

    #[test]
    fn wraps_around_capacity() {
        let mut buffer = RingBuffer::new(3);
        for i in 0..3 {
            buffer.push_back(i).unwrap();
        }
        assert_eq!(buffer.pop_front(), Ok(0));
        buffer.push_back(3).unwrap();
        let collected: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(collected, vec![1, 2, 3]);
    }

    #[test]
    fn negative_indices_count_from_the_back() {
        let mut buffer = RingBuffer::new(4);
        buffer.push_back(10).unwrap();
        buffer.push_back(20).unwrap();
        buffer.push_back(30).unwrap();
        assert_eq!(buffer.at(-1), Ok(&30));
        assert_eq!(buffer.at(0), Ok(&10));
        assert_eq!(buffer.at(3), Err(RingBufferError::OutOfRange));
    }

    #[test]
    fn shrink_drops_from_either_end() {
        let mut buffer = RingBuffer::new(4);
        for i in 0..4 {
            buffer.push_back(i).unwrap();
        }
        buffer.shrink(1).unwrap();
        buffer.shrink(-1).unwrap();
        let collected: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(collected, vec![1, 2]);
        assert_eq!(buffer.shrink(3), Err(RingBufferError::OutOfRange));
    }

    #[test]
    fn slice_copies_a_range() {
        let mut buffer = RingBuffer::new(4);
        for i in 0..4 {
            buffer.push_back(i).unwrap();
        }
        assert_eq!(buffer.slice(1, 3), Ok(vec![1, 2]));
        assert_eq!(buffer.slice(0, -1), Ok(vec![0, 1, 2]));
        assert_eq!(buffer.slice(0, 5), Err(RingBufferError::OutOfRange));
    }

    #[test]
    fn reset_empties_the_buffer() {
        let mut buffer = RingBuffer::new(2);
        buffer.push_back(1).unwrap();
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.pop_front(), Err(RingBufferError::Empty));
    }
}
