//! A VM binding for tests.
//!
//! Objects have a fixed layout:
//!
//! ```text
//! offset 0: u32 size in bytes
//! offset 4: u16 number of reference slots
//! offset 6: u8  GC byte
//! offset 8: reference slots, one word each, followed by payload
//! ```
//!
//! Roots are boxed slots owned by the mock, so the collector can update them in place.

use crate::memory_manager;
use crate::plan::{AllocationSemantics, CopyContext, CopySemantics, Mutator};
use crate::util::alloc::AllocationError;
use crate::util::constants::{BYTES_IN_ADDRESS, MIN_OBJECT_SIZE};
use crate::util::opaque_pointer::*;
use crate::util::{Address, ObjectReference};
use crate::vm::{ActivePlan, Collection, ObjectModel, Scanning, SlotVisitor, VMBinding};
use std::sync::Mutex;

pub const SIZE_OFFSET: usize = 0;
pub const NREFS_OFFSET: usize = 4;
pub const GC_BYTE_OFFSET: usize = 6;
pub const HEADER_BYTES: usize = 8;

lazy_static! {
    // The mutex may get poisoned any time. Accessing this mutex needs to deal with the poisoned case.
    // One can use read/write_mockvm to access mock vm.
    static ref MOCK_VM_INSTANCE: Mutex<MockVM> = Mutex::new(MockVM::default());
}

pub fn read_mockvm<F, R>(func: F) -> R
where
    F: FnOnce(&MockVM) -> R,
{
    let lock = MOCK_VM_INSTANCE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    func(&lock)
}

pub fn write_mockvm<F, R>(func: F) -> R
where
    F: FnOnce(&mut MockVM) -> R,
{
    let mut lock = MOCK_VM_INSTANCE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    func(&mut lock)
}

/// Run a test against a fresh mock VM. Tests using the mock VM run serially.
pub fn with_mockvm<S, T, C>(setup: S, test: T, cleanup: C)
where
    S: FnOnce() -> MockVM,
    T: FnOnce() + std::panic::UnwindSafe,
    C: FnOnce(),
{
    super::serial_test(|| {
        // Setup
        {
            write_mockvm(|mock| *mock = setup());
        }
        super::with_cleanup(test, cleanup);
    })
}

pub fn default_setup() -> MockVM {
    MockVM::default()
}

/// A mock whose out-of-memory hook records the error and returns.
pub fn oom_returns_setup() -> MockVM {
    MockVM {
        oom_panics: false,
        ..MockVM::default()
    }
}

pub fn no_cleanup() {}

struct MutatorPtr(*mut Mutator<MockVM>);

// Mutators are only dereferenced by the test thread that owns them or by the collection
// driver while that thread is stopped.
unsafe impl Send for MutatorPtr {}
unsafe impl Sync for MutatorPtr {}

pub struct MockVM {
    roots: Vec<Box<ObjectReference>>,
    mutators: Vec<MutatorPtr>,
    pub stop_count: usize,
    pub resume_count: usize,
    /// Does `out_of_memory` panic, like the default hook, or record and return?
    pub oom_panics: bool,
    pub oom_calls: Vec<AllocationError>,
}

impl Default for MockVM {
    fn default() -> Self {
        MockVM {
            roots: vec![],
            mutators: vec![],
            stop_count: 0,
            resume_count: 0,
            oom_panics: true,
            oom_calls: vec![],
        }
    }
}

impl VMBinding for MockVM {
    type VMObjectModel = MockVM;
    type VMScanning = MockVM;
    type VMCollection = MockVM;
    type VMActivePlan = MockVM;
}

impl ObjectModel<MockVM> for MockVM {
    fn copy(
        from: ObjectReference,
        semantics: CopySemantics,
        copy_context: &mut CopyContext<MockVM>,
    ) -> ObjectReference {
        let bytes = Self::get_current_size(from);
        let align = Self::get_align_when_copied(from);
        let dst = copy_context.alloc_copy(from, bytes, align, 0, semantics);
        unsafe {
            std::ptr::copy_nonoverlapping(
                from.to_address().to_ptr::<u8>(),
                dst.to_mut_ptr::<u8>(),
                bytes,
            );
        }
        let to = ObjectReference::from_raw_address(dst);
        copy_context.post_copy(to, bytes, semantics);
        to
    }

    fn get_current_size(object: ObjectReference) -> usize {
        unsafe { (object.to_address() + SIZE_OFFSET).load::<u32>() as usize }
    }

    fn read_gc_header_bits(object: ObjectReference) -> u8 {
        unsafe { (object.to_address() + GC_BYTE_OFFSET).load::<u8>() }
    }

    fn write_gc_header_bits(object: ObjectReference, bits: u8) {
        unsafe { (object.to_address() + GC_BYTE_OFFSET).store::<u8>(bits) }
    }
}

impl Scanning<MockVM> for MockVM {
    fn scan_object<SV: SlotVisitor>(_tls: VMWorkerThread, object: ObjectReference, slot_visitor: &mut SV) {
        for i in 0..nrefs(object) {
            slot_visitor.visit_slot(slot(object, i));
        }
    }

    fn scan_roots<SV: SlotVisitor>(_tls: VMWorkerThread, slot_visitor: &mut SV) {
        let slots: Vec<Address> = read_mockvm(|mock| {
            mock.roots.iter().map(|root| Address::from_ref(&**root)).collect()
        });
        for slot in slots {
            slot_visitor.visit_slot(slot);
        }
    }
}

impl Collection<MockVM> for MockVM {
    fn stop_all_mutators(_tls: VMWorkerThread) {
        write_mockvm(|mock| mock.stop_count += 1);
    }

    fn resume_mutators(_tls: VMWorkerThread) {
        write_mockvm(|mock| mock.resume_count += 1);
    }

    fn out_of_memory(_tls: VMThread, err_kind: AllocationError) {
        let panics = write_mockvm(|mock| {
            mock.oom_calls.push(err_kind);
            mock.oom_panics
        });
        if panics {
            panic!("Out of memory with {:?}!", err_kind);
        }
    }
}

impl ActivePlan<MockVM> for MockVM {
    fn is_mutator(tls: VMThread) -> bool {
        read_mockvm(|mock| {
            mock.mutators
                .iter()
                .any(|m| unsafe { (*m.0).get_tls().0 } == tls)
        })
    }

    fn mutator(tls: VMMutatorThread) -> &'static mut Mutator<MockVM> {
        let ptr = read_mockvm(|mock| {
            mock.mutators
                .iter()
                .map(|m| m.0)
                .find(|m| unsafe { (**m).get_tls() } == tls)
        });
        match ptr {
            Some(ptr) => unsafe { &mut *ptr },
            None => panic!("{:?} is not a registered mutator", tls),
        }
    }

    fn mutators<'a>() -> Box<dyn Iterator<Item = &'a mut Mutator<MockVM>> + 'a> {
        let ptrs: Vec<*mut Mutator<MockVM>> =
            read_mockvm(|mock| mock.mutators.iter().map(|m| m.0).collect());
        Box::new(ptrs.into_iter().map(|ptr| unsafe { &mut *ptr }))
    }

    fn number_of_mutators() -> usize {
        read_mockvm(|mock| mock.mutators.len())
    }
}

/// The thread handle of the `n`th mutator of a test.
pub fn mutator_tls(n: usize) -> VMMutatorThread {
    let addr = unsafe { Address::from_usize((n + 1) * BYTES_IN_ADDRESS) };
    VMMutatorThread(VMThread(OpaquePointer::from_address(addr)))
}

/// Make the mutator visible to collections.
pub fn register_mutator(mutator: &mut Mutator<MockVM>) {
    let ptr = mutator as *mut Mutator<MockVM>;
    write_mockvm(|mock| mock.mutators.push(MutatorPtr(ptr)));
}

pub fn unregister_mutator(mutator: &Mutator<MockVM>) {
    let tls = mutator.get_tls();
    write_mockvm(|mock| {
        mock.mutators
            .retain(|m| unsafe { (*m.0).get_tls() } != tls)
    });
}

/// Add a root and return its index.
pub fn add_root(object: ObjectReference) -> usize {
    write_mockvm(|mock| {
        mock.roots.push(Box::new(object));
        mock.roots.len() - 1
    })
}

/// The current value of a root. Collections update it if the object moved.
pub fn root(index: usize) -> ObjectReference {
    read_mockvm(|mock| *mock.roots[index])
}

pub fn set_root(index: usize, object: ObjectReference) {
    write_mockvm(|mock| *mock.roots[index] = object);
}

pub fn clear_roots() {
    write_mockvm(|mock| mock.roots.clear());
}

/// The size of an object with `nrefs` reference slots and no payload.
pub fn object_bytes(nrefs: usize) -> usize {
    usize::max(HEADER_BYTES + nrefs * BYTES_IN_ADDRESS, MIN_OBJECT_SIZE)
}

/// Allocate and initialize an object with `nrefs` null slots. Returns null if the allocation
/// failed and the out-of-memory hook returned.
pub fn alloc_object(
    mutator: &mut Mutator<MockVM>,
    nrefs: usize,
    semantics: AllocationSemantics,
) -> ObjectReference {
    alloc_object_with_size(mutator, object_bytes(nrefs), nrefs, semantics)
}

/// Same as [`alloc_object`], with room for a payload after the slots.
pub fn alloc_object_with_size(
    mutator: &mut Mutator<MockVM>,
    bytes: usize,
    nrefs: usize,
    semantics: AllocationSemantics,
) -> ObjectReference {
    assert!(bytes >= object_bytes(nrefs), "{} bytes cannot hold {} slots", bytes, nrefs);
    let addr = memory_manager::alloc(mutator, bytes, MockVM::MIN_ALIGNMENT, 0, semantics);
    if addr.is_zero() {
        return ObjectReference::NULL;
    }
    unsafe {
        (addr + SIZE_OFFSET).store::<u32>(bytes as u32);
        (addr + NREFS_OFFSET).store::<u16>(nrefs as u16);
        (addr + GC_BYTE_OFFSET).store::<u8>(0);
        for i in 0..nrefs {
            (addr + HEADER_BYTES + i * BYTES_IN_ADDRESS).store(ObjectReference::NULL);
        }
    }
    let object = ObjectReference::from_raw_address(addr);
    memory_manager::post_alloc(mutator, object, bytes, semantics);
    object
}

pub fn nrefs(object: ObjectReference) -> usize {
    unsafe { (object.to_address() + NREFS_OFFSET).load::<u16>() as usize }
}

pub fn slot(object: ObjectReference, index: usize) -> Address {
    debug_assert!(index < nrefs(object));
    object.to_address() + HEADER_BYTES + index * BYTES_IN_ADDRESS
}

pub fn get_ref(object: ObjectReference, index: usize) -> ObjectReference {
    unsafe { slot(object, index).load::<ObjectReference>() }
}

/// Store a reference through the write barrier.
pub fn set_ref(
    mutator: &mut Mutator<MockVM>,
    object: ObjectReference,
    index: usize,
    target: ObjectReference,
) {
    memory_manager::object_reference_write(mutator, object, slot(object, index), target);
}

/// The first payload byte, right after the reference slots.
pub fn payload(object: ObjectReference) -> Address {
    object.to_address() + HEADER_BYTES + nrefs(object) * BYTES_IN_ADDRESS
}

/// Allocate an object with `nrefs` null slots and a one-word payload holding `id`. Panics
/// if the allocation fails.
pub fn alloc_with_id(
    mutator: &mut Mutator<MockVM>,
    nrefs: usize,
    id: usize,
    semantics: AllocationSemantics,
) -> ObjectReference {
    let bytes = usize::max(HEADER_BYTES + (nrefs + 1) * BYTES_IN_ADDRESS, MIN_OBJECT_SIZE);
    let object = alloc_object_with_size(mutator, bytes, nrefs, semantics);
    assert!(!object.is_null(), "failed to allocate object {}", id);
    unsafe { payload(object).store::<usize>(id) };
    object
}

/// The payload written by [`alloc_with_id`].
pub fn id_of(object: ObjectReference) -> usize {
    unsafe { payload(object).load::<usize>() }
}
