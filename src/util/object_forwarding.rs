use crate::plan::{CopyContext, CopySemantics};
use crate::util::constants::LOG_MIN_OBJECT_SIZE;
use crate::util::metadata::SideTable;
use crate::util::{Address, ObjectReference};
use crate::vm::{ObjectModel, VMBinding};
use crossbeam::utils::Backoff;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

const FORWARDING_NOT_TRIGGERED_YET: u8 = 0b00;
const BEING_FORWARDED: u8 = 0b10;
const FORWARDED: u8 = 0b11;

pub fn state_is_forwarded_or_being_forwarded(state: u8) -> bool {
    state != FORWARDING_NOT_TRIGGERED_YET
}

pub fn state_is_being_forwarded(state: u8) -> bool {
    state == BEING_FORWARDED
}

/// Forwarding states and forwarding pointers of every slot in a copying space.
///
/// The state of a slot goes `NOT_TRIGGERED_YET -> BEING_FORWARDED -> FORWARDED` at most once
/// per collection. The move to `BEING_FORWARDED` is a CAS and is the claim step: exactly one
/// thread wins it and copies the object. The pointer is published before the state becomes
/// `FORWARDED` with a release store, so a thread that sees `FORWARDED` sees the pointer.
pub struct ForwardingTable {
    states: SideTable<AtomicU8>,
    pointers: SideTable<AtomicUsize>,
}

impl ForwardingTable {
    pub fn new(start: Address, bytes: usize) -> std::io::Result<Self> {
        Ok(ForwardingTable {
            states: SideTable::new(start, bytes, LOG_MIN_OBJECT_SIZE)?,
            pointers: SideTable::new(start, bytes, LOG_MIN_OBJECT_SIZE)?,
        })
    }

    pub fn forwarding_state(&self, object: ObjectReference) -> u8 {
        self.states.get(object.to_address()).load(Ordering::Acquire)
    }

    pub fn is_forwarded(&self, object: ObjectReference) -> bool {
        self.forwarding_state(object) == FORWARDED
    }

    /// Try to claim `object` for copying. Returns the state seen before the attempt:
    /// `NOT_TRIGGERED_YET` means this thread won and must forward the object.
    pub fn attempt_to_forward(&self, object: ObjectReference) -> u8 {
        let state = self.states.get(object.to_address());
        loop {
            let old = state.load(Ordering::Acquire);
            if old != FORWARDING_NOT_TRIGGERED_YET {
                return old;
            }
            if state
                .compare_exchange_weak(old, BEING_FORWARDED, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                return old;
            }
        }
    }

    /// Wait until another thread finished forwarding `object`, then return the new copy.
    pub fn spin_and_get_forwarded_object(&self, object: ObjectReference, state: u8) -> ObjectReference {
        let backoff = Backoff::new();
        let mut state = state;
        while state == BEING_FORWARDED {
            backoff.snooze();
            state = self.forwarding_state(object);
        }
        assert_eq!(
            state, FORWARDED,
            "corrupt forwarding state {:#b} for {}",
            state, object
        );
        self.read_forwarding_pointer(object)
    }

    pub fn read_forwarding_pointer(&self, object: ObjectReference) -> ObjectReference {
        debug_assert!(self.is_forwarded(object), "{} is not forwarded", object);
        let raw = self.pointers.get(object.to_address()).load(Ordering::Relaxed);
        unsafe { Address::from_usize(raw) }.to_object_reference()
    }

    /// Copy a claimed object and publish its new address.
    pub fn forward_object<VM: VMBinding>(
        &self,
        object: ObjectReference,
        semantics: CopySemantics,
        copy_context: &mut CopyContext<VM>,
    ) -> ObjectReference {
        let new_object = VM::VMObjectModel::copy(object, semantics, copy_context);
        self.set_forwarded(object, new_object);
        new_object
    }

    pub(crate) fn set_forwarded(&self, object: ObjectReference, new_object: ObjectReference) {
        debug_assert!(
            state_is_being_forwarded(self.forwarding_state(object)),
            "{} was not claimed before forwarding",
            object
        );
        trace!("forward {} -> {}", object, new_object);
        self.pointers
            .get(object.to_address())
            .store(new_object.value(), Ordering::Relaxed);
        self.states
            .get(object.to_address())
            .store(FORWARDED, Ordering::Release);
    }

    /// Forget all forwarding in `[start, start + bytes)`. Only called once the range has been
    /// released.
    pub fn clear_range(&self, start: Address, bytes: usize) {
        self.states.clear_range(start, bytes);
        self.pointers.clear_range(start, bytes);
    }
}
