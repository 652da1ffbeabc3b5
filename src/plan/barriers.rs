//! Write barriers.

use crate::plan::Trace;
use crate::util::constants::{LOG_BYTES_IN_ADDRESS, LOG_BYTES_IN_PAGE};
use crate::util::header_byte;
use crate::util::{Address, ObjectReference};
use crate::vm::VMBinding;
use std::marker::PhantomData;
use std::sync::Arc;

/// Objects buffered by a barrier before they are handed to the collector.
const MODBUF_CAPACITY: usize = 1 << (LOG_BYTES_IN_PAGE - LOG_BYTES_IN_ADDRESS);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BarrierSelector {
    NoBarrier,
    ObjectBarrier,
}

/// A barrier runs around every reference store the mutator makes into the heap.
pub trait Barrier<VM: VMBinding>: 'static + Send {
    /// Store `target` into `slot` of `src`.
    fn object_reference_write(&mut self, src: ObjectReference, slot: Address, target: ObjectReference) {
        unsafe { slot.store(target) };
        self.object_reference_write_post(src, slot, target);
    }

    fn object_reference_write_post(&mut self, src: ObjectReference, slot: Address, target: ObjectReference);

    /// Hand buffered state to the collector.
    fn flush(&mut self);
}

pub struct NoBarrier;

impl<VM: VMBinding> Barrier<VM> for NoBarrier {
    fn object_reference_write_post(&mut self, _src: ObjectReference, _slot: Address, _target: ObjectReference) {}

    fn flush(&mut self) {}
}

/// Remembers every object outside the nursery the first time one of its fields is written
/// after a collection.
///
/// Such objects carry the unlogged bit in their header. The barrier clears it and records the
/// object. At the next collection each recorded object is scanned as a root of a nursery
/// collection and gets its unlogged bit back.
pub struct ObjectBarrier<VM: VMBinding> {
    trace: Arc<Trace>,
    modbuf: Vec<ObjectReference>,
    _p: PhantomData<VM>,
}

impl<VM: VMBinding> ObjectBarrier<VM> {
    pub fn new(trace: Arc<Trace>) -> Self {
        ObjectBarrier {
            trace,
            modbuf: Vec::with_capacity(MODBUF_CAPACITY),
            _p: PhantomData,
        }
    }

    fn enqueue_node(&mut self, object: ObjectReference) {
        if header_byte::is_unlogged::<VM>(object) {
            header_byte::clear_unlogged::<VM>(object);
            self.modbuf.push(object);
            if self.modbuf.len() >= MODBUF_CAPACITY {
                self.flush();
            }
        }
    }
}

impl<VM: VMBinding> Barrier<VM> for ObjectBarrier<VM> {
    fn object_reference_write_post(&mut self, src: ObjectReference, _slot: Address, _target: ObjectReference) {
        self.enqueue_node(src);
    }

    fn flush(&mut self) {
        if !self.modbuf.is_empty() {
            let modbuf = std::mem::replace(&mut self.modbuf, Vec::with_capacity(MODBUF_CAPACITY));
            trace!("barrier: {} objects remembered", modbuf.len());
            self.trace.push_remembered(modbuf);
        }
    }
}
