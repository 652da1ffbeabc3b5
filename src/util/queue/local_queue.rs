use super::{SharedQueue, BUFFER_SIZE};
use std::mem;
use std::sync::Arc;

/// A thread-local buffer in front of a [`SharedQueue`]. Full buffers are handed to the shared
/// queue as one packet, and an empty buffer is refilled with a whole packet.
pub struct LocalQueue<T> {
    shared: Arc<SharedQueue<T>>,
    buffer: Vec<T>,
}

impl<T> LocalQueue<T> {
    pub fn new(shared: Arc<SharedQueue<T>>) -> Self {
        LocalQueue {
            shared,
            buffer: Vec::with_capacity(BUFFER_SIZE),
        }
    }

    pub fn enqueue(&mut self, v: T) {
        if self.buffer.len() >= BUFFER_SIZE {
            self.flush();
        }
        self.buffer.push(v);
    }

    /// Pop local work first, then shared work. Blocks in the shared queue when both are
    /// empty, and returns `None` once all participants ran out of work.
    pub fn dequeue(&mut self) -> Option<T> {
        loop {
            if let Some(v) = self.buffer.pop() {
                return Some(v);
            }
            self.buffer = self.shared.pop()?;
        }
    }

    /// Publish the local buffer so other threads can take it.
    pub fn flush(&mut self) {
        if !self.buffer.is_empty() {
            let packet = mem::replace(&mut self.buffer, Vec::with_capacity(BUFFER_SIZE));
            self.shared.push(packet);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
