//! The per-thread half of a transitive closure.

use crate::plan::{CopyContext, Plan, Trace};
use crate::util::header_byte;
use crate::util::opaque_pointer::*;
use crate::util::queue::LocalQueue;
use crate::util::{Address, ObjectReference};
use crate::vm::{Scanning, VMBinding};
use std::sync::Arc;

/// Root slots per packet handed from the primary collector to the others.
const ROOT_PACKET_SIZE: usize = 256;

/// Where a [`TraceLocal`] is in its collection cycle:
/// `Unused -> Prepare -> Closure (repeatable) -> Release`, and back to `Prepare` for the next
/// collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceState {
    Unused,
    Prepare,
    Closure,
    Release,
}

/// The per-collector view of a [`Trace`].
///
/// All liveness and forwarding decisions of a collection are made through
/// [`TraceLocal::trace_object`], which dispatches to the plan and from there to the space
/// that owns the object. Objects that need scanning are buffered locally and shared with the
/// other collectors through the global queue.
pub struct TraceLocal<VM: VMBinding> {
    ordinal: usize,
    tls: VMWorkerThread,
    state: TraceState,
    trace: Arc<Trace>,
    values: LocalQueue<ObjectReference>,
    /// The copy allocators of this collector.
    pub copy: CopyContext<VM>,
    plan: &'static dyn Plan<VM = VM>,
}

impl<VM: VMBinding> TraceLocal<VM> {
    pub fn new(
        ordinal: usize,
        tls: VMWorkerThread,
        plan: &'static dyn Plan<VM = VM>,
        copy: CopyContext<VM>,
    ) -> Self {
        let trace = plan.base().trace.clone();
        TraceLocal {
            ordinal,
            tls,
            state: TraceState::Unused,
            values: LocalQueue::new(trace.values()),
            trace,
            copy,
            plan,
        }
    }

    pub fn state(&self) -> TraceState {
        self.state
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The primary collector enumerates the roots.
    pub fn is_primary(&self) -> bool {
        self.ordinal == 0
    }

    pub fn prepare(&mut self) {
        match self.state {
            TraceState::Unused | TraceState::Release => {}
            state => panic!("collector {}: prepare in state {:?}", self.ordinal, state),
        }
        self.values.reset();
        self.state = TraceState::Prepare;
    }

    /// Enumerate the roots into the shared trace. Only the primary collector does this, so
    /// roots are enumerated exactly once per collection.
    pub fn process_roots(&mut self) {
        assert_eq!(
            self.state,
            TraceState::Prepare,
            "collector {}: roots outside of prepare",
            self.ordinal
        );
        if !self.is_primary() {
            return;
        }
        let mut slots: Vec<Address> = vec![];
        VM::VMScanning::scan_roots(self.tls, &mut |slot: Address| slots.push(slot));
        debug!("collector {}: {} root slots", self.ordinal, slots.len());
        for packet in slots.chunks(ROOT_PACKET_SIZE) {
            self.trace.push_root_slots(packet.to_vec());
        }
    }

    /// Run the closure until no collector has work left.
    pub fn complete_trace(&mut self) {
        match self.state {
            TraceState::Prepare | TraceState::Closure => {}
            state => panic!("collector {}: closure in state {:?}", self.ordinal, state),
        }
        self.state = TraceState::Closure;

        while let Some(slots) = self.trace.pop_root_slots() {
            for slot in slots {
                self.process_slot(slot);
            }
        }

        let nursery_gc = self.plan.is_current_gc_nursery();
        while let Some(objects) = self.trace.pop_remembered() {
            for object in objects {
                // The object can be logged again by the next store into it.
                header_byte::set_unlogged::<VM>(object);
                if nursery_gc {
                    self.scan_object(object);
                }
            }
        }

        while let Some(object) = self.values.dequeue() {
            self.scan_object(object);
        }
    }

    pub fn release(&mut self) {
        assert_eq!(
            self.state,
            TraceState::Closure,
            "collector {}: release without a closure",
            self.ordinal
        );
        debug_assert!(self.values.is_empty());
        self.values.reset();
        self.state = TraceState::Release;
    }

    /// Trace the object in a slot and update the slot if the object moved.
    pub fn process_slot(&mut self, slot: Address) {
        let object = unsafe { slot.load::<ObjectReference>() };
        let new_object = self.trace_object(object);
        if new_object != object {
            unsafe { slot.store(new_object) };
        }
    }

    /// Queue an object for scanning.
    pub fn process_node(&mut self, object: ObjectReference) {
        self.values.enqueue(object);
    }

    fn scan_object(&mut self, object: ObjectReference) {
        let tls = self.tls;
        VM::VMScanning::scan_object(tls, object, &mut |slot: Address| self.process_slot(slot));
    }

    /// Mark or forward `object` and return its address after this collection. Tracing the
    /// same object again in the same collection returns the same address and scans nothing.
    ///
    /// Panics if `object` is in no space of the plan.
    pub fn trace_object(&mut self, object: ObjectReference) -> ObjectReference {
        if object.is_null() {
            return object;
        }
        match self.state {
            TraceState::Prepare | TraceState::Closure => {}
            state => panic!(
                "collector {}: tracing {} in state {:?}",
                self.ordinal, object, state
            ),
        }
        #[cfg(feature = "extreme_assertions")]
        {
            let owners = self
                .plan
                .get_spaces()
                .iter()
                .filter(|s| s.in_space(object))
                .count();
            assert_eq!(owners, 1, "{} is in {} spaces", object, owners);
        }
        let plan = self.plan;
        plan.trace_object(self, object)
    }

    pub fn will_not_move_in_current_collection(&self, object: ObjectReference) -> bool {
        object.is_null() || self.plan.will_not_move_in_current_collection(object)
    }
}
