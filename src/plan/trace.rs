use crate::util::queue::SharedQueue;
use crate::util::{Address, ObjectReference};
use crossbeam::queue::SegQueue;
use std::sync::Arc;

/// The state of one transitive closure that all collector threads share.
///
/// * `values`: objects waiting to be scanned. Termination is detected by the queue: the
///   closure is complete once every participating thread waits on an empty queue.
/// * root slots, found by the primary collector during the roots phase and consumed by every
///   collector at the start of the closure.
/// * remembered objects, logged by the write barrier of the mutators since the last
///   collection.
pub struct Trace {
    values: Arc<SharedQueue<ObjectReference>>,
    root_slots: SegQueue<Vec<Address>>,
    remembered: SegQueue<Vec<ObjectReference>>,
}

impl Trace {
    pub fn new() -> Self {
        Trace {
            values: Arc::new(SharedQueue::new()),
            root_slots: SegQueue::new(),
            remembered: SegQueue::new(),
        }
    }

    /// Start a closure with `participants` collector threads. Remembered objects are kept.
    pub fn prepare(&self, participants: usize) {
        self.values.reset(participants);
        while self.root_slots.pop().is_some() {}
    }

    pub fn release(&self) {
        assert!(
            self.values.is_empty() && self.root_slots.is_empty(),
            "trace released with pending work"
        );
    }

    pub fn values(&self) -> Arc<SharedQueue<ObjectReference>> {
        self.values.clone()
    }

    pub fn push_root_slots(&self, slots: Vec<Address>) {
        if !slots.is_empty() {
            self.root_slots.push(slots);
        }
    }

    pub fn pop_root_slots(&self) -> Option<Vec<Address>> {
        self.root_slots.pop()
    }

    pub fn push_remembered(&self, objects: Vec<ObjectReference>) {
        if !objects.is_empty() {
            self.remembered.push(objects);
        }
    }

    pub fn pop_remembered(&self) -> Option<Vec<ObjectReference>> {
        self.remembered.pop()
    }

    pub fn has_remembered(&self) -> bool {
        !self.remembered.is_empty()
    }

    /// Wake every collector blocked in the closure with a panic.
    pub fn abort(&self) {
        self.values.abort();
    }
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_keeps_remembered_objects() {
        let trace = Trace::new();
        let obj = unsafe { Address::from_usize(0x1000) }.to_object_reference();
        trace.push_remembered(vec![obj]);
        trace.push_root_slots(vec![unsafe { Address::from_usize(0x2000) }]);
        trace.push_root_slots(vec![]);
        trace.prepare(1);
        assert!(trace.pop_root_slots().is_none());
        assert_eq!(trace.pop_remembered(), Some(vec![obj]));
        assert!(!trace.has_remembered());
        trace.release();
    }
}
