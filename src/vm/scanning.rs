use crate::util::opaque_pointer::VMWorkerThread;
use crate::util::{Address, ObjectReference};
use crate::vm::VMBinding;

/// Receives the address of each reference slot found while scanning.
pub trait SlotVisitor {
    /// `slot` holds an [`ObjectReference`] (possibly null). The collector may overwrite it.
    fn visit_slot(&mut self, slot: Address);
}

impl<F: FnMut(Address)> SlotVisitor for F {
    fn visit_slot(&mut self, slot: Address) {
        self(slot)
    }
}

pub trait Scanning<VM: VMBinding> {
    /// Visit every reference field of `object`.
    fn scan_object<SV: SlotVisitor>(tls: VMWorkerThread, object: ObjectReference, slot_visitor: &mut SV);

    /// Visit every root slot. Called once per collection, by one collector thread, while all
    /// mutators are stopped.
    fn scan_roots<SV: SlotVisitor>(tls: VMWorkerThread, slot_visitor: &mut SV);
}
