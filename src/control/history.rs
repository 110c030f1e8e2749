/// Fixed-capacity FIFO ring used for the integral window
use std::fmt;
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Push on a full buffer; pop the oldest value first
    Overflow,
    /// Pop on an empty buffer
    Underflow,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::Overflow => write!(f, "history buffer is full"),
            BufferError::Underflow => write!(f, "history buffer is empty"),
        }
    }
}

impl std::error::Error for BufferError {}

#[derive(Debug, Clone)]
pub struct BoundedHistoryBuffer<T, const N: usize> {
    slots: [T; N],
    start: usize,
    len: usize,
}

impl<T: Copy + Default, const N: usize> BoundedHistoryBuffer<T, N> {
    pub fn new() -> Self {
        BoundedHistoryBuffer {
            slots: [T::default(); N],
            start: 0,
            len: 0,
        }
    }

    /// Append a value behind the newest one
    pub fn push(&mut self, value: T) -> Result<(), BufferError> {
        if self.len == N {
            return Err(BufferError::Overflow);
        }
        self.slots[(self.start + self.len) % N] = value;
        self.len += 1;
        Ok(())
    }

    /// Remove and return the oldest value
    pub fn pop(&mut self) -> Result<T, BufferError> {
        if self.len == 0 {
            return Err(BufferError::Underflow);
        }
        let value = self.slots[self.start];
        self.start = (self.start + 1) % N;
        self.len -= 1;
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.slots[(self.start + i) % N])
    }
}

impl<T: Copy + Default + AddAssign, const N: usize> BoundedHistoryBuffer<T, N> {
    /// Sum of the occupied slots
    pub fn sum(&self) -> T {
        let mut total = T::default();
        for value in self.iter() {
            total += value;
        }
        total
    }
}

impl<T: Copy + Default, const N: usize> Default for BoundedHistoryBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
