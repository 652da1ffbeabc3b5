//! VM-to-MMTk interface: safe Rust APIs.
//!
//! A VM binding drives the collector through the functions in this module. Mutators are handed
//! out as `Box<Mutator>`, and allocation needs a `&mut Mutator`. A binding that stores the
//! mutator in native thread-local storage is responsible for forging that reference safely.

use crate::mmtk::MMTKBuilder;
use crate::mmtk::MMTK;
use crate::plan::global::create_mutator;
use crate::plan::{AllocationSemantics, Mutator, ParallelCollectorGroup};
use crate::policy::space::Space;
use crate::util::heap::HeapLayoutError;
use crate::util::opaque_pointer::*;
use crate::util::statistics::CollectionStats;
use crate::util::{Address, ObjectReference};
use crate::vm::VMBinding;
use std::sync::atomic::Ordering;

/// Initialize an MMTk instance.
///
/// We expect a binding to initialize MMTk in the following steps:
///
/// 1. Create an [`MMTKBuilder`] and set options on it with [`MMTKBuilder::set_option`], or
///    through `MMTK_*` environment variables.
/// 2. Call this function with the builder. It reserves the virtual memory of every space of
///    the selected plan, and fails if the heap cannot be laid out.
/// 3. Call [`initialize_collection`] once the VM can stop and resume its threads. No
///    collection happens before that call.
///
/// This function attempts to install the built-in logger. A VM that wants its own logger
/// should install it first.
///
/// The returned box bounds the lifetime of the instance, but most of the API expects
/// `&'static MMTK`. Bindings usually leak the box or keep the instance in a lazily initialized
/// static.
pub fn mmtk_init<VM: VMBinding>(builder: &MMTKBuilder) -> Result<Box<MMTK<VM>>, HeapLayoutError> {
    match crate::util::logger::try_init() {
        Ok(_) => debug!("MMTk initialized the logger."),
        Err(_) => debug!(
            "MMTk failed to initialize the logger. Possibly a logger has been initialized by user."
        ),
    }
    let mmtk = builder.build()?;
    info!(
        "Initialized MMTk with {:?} ({} bytes heap, {} collector threads)",
        mmtk.options.plan, mmtk.options.heap_size, mmtk.options.threads
    );
    Ok(Box::new(mmtk))
}

/// Allow MMTk to perform collections. A VM should call this once its thread system can
/// stop and resume mutators. Collection requests before this call are dropped.
///
/// Arguments:
/// * `mmtk`: A reference to an MMTk instance.
/// * `tls`: The thread that will be reported to the VM as the collector thread.
pub fn initialize_collection<VM: VMBinding>(mmtk: &'static MMTK<VM>, tls: VMThread) {
    assert!(
        !mmtk.state.is_initialized(),
        "MMTk collection has been initialized (was initialize_collection() already called before?)"
    );
    let plan: &'static dyn crate::plan::Plan<VM = VM> = &*mmtk.plan;
    mmtk.gc_trigger.set_plan(plan);
    mmtk.controller.set_collectors(ParallelCollectorGroup::new(
        mmtk.options.threads,
        VMWorkerThread(tls),
        plan,
        mmtk.allocator_context.clone(),
    ));
    mmtk.state.initialized.store(true, Ordering::SeqCst);
    debug!("collection enabled with {} collectors", mmtk.options.threads);
}

/// Request MMTk to create a mutator for the given thread. The ownership of the returned
/// boxed mutator belongs to the binding, and it must be handed back through
/// [`destroy_mutator`].
///
/// Arguments:
/// * `mmtk`: A reference to an MMTk instance.
/// * `tls`: The thread that will be associated with the mutator.
pub fn bind_mutator<VM: VMBinding>(mmtk: &'static MMTK<VM>, tls: VMMutatorThread) -> Box<Mutator<VM>> {
    let mutator = create_mutator(tls, mmtk);
    debug!("bound mutator for {:?}", tls);
    mutator
}

/// Report to MMTk that a mutator is no longer needed. Its allocators return their local
/// buffers and its barrier is flushed.
///
/// Arguments:
/// * `mutator`: The mutator to destroy.
pub fn destroy_mutator<VM: VMBinding>(mut mutator: Box<Mutator<VM>>) {
    mutator.on_destroy();
    debug!("destroyed mutator for {:?}", mutator.get_tls());
}

/// Flush the mutator's local state (write barrier buffers) to the collector.
///
/// Arguments:
/// * `mutator`: A reference to the mutator.
pub fn flush_mutator<VM: VMBinding>(mutator: &mut Mutator<VM>) {
    mutator.flush()
}

/// Allocate memory for an object. The returned address is zero only if the heap is exhausted
/// and [`crate::vm::Collection::out_of_memory`] returned.
///
/// Requests larger than the plan's large object threshold are served by the large object
/// space whatever `semantics` says.
///
/// Arguments:
/// * `mutator`: The mutator to perform this allocation request.
/// * `size`: The number of bytes required for the object.
/// * `align`: Required alignment for the object.
/// * `offset`: Offset associated with the alignment.
/// * `semantics`: The allocation semantic required for the allocation.
pub fn alloc<VM: VMBinding>(
    mutator: &mut Mutator<VM>,
    size: usize,
    align: usize,
    offset: usize,
    semantics: AllocationSemantics,
) -> Address {
    mutator.alloc(size, align, offset, semantics)
}

/// Same as [`alloc`], with an allocation site identifier that shows up in the allocation
/// trace log.
pub fn alloc_with_site<VM: VMBinding>(
    mutator: &mut Mutator<VM>,
    size: usize,
    align: usize,
    offset: usize,
    semantics: AllocationSemantics,
    site: usize,
) -> Address {
    mutator.alloc_with_site(size, align, offset, semantics, site)
}

/// Perform post-allocation actions, usually initializing object metadata. The VM must call
/// this after every [`alloc`] and before the object is visible to other threads or to root
/// scanning.
///
/// Arguments:
/// * `mutator`: The mutator that allocated the object.
/// * `refer`: The newly allocated object.
/// * `bytes`: The size of the space allocated for the object (in bytes).
/// * `semantics`: The allocation semantics used for the allocation.
pub fn post_alloc<VM: VMBinding>(
    mutator: &mut Mutator<VM>,
    refer: ObjectReference,
    bytes: usize,
    semantics: AllocationSemantics,
) {
    mutator.post_alloc(refer, bytes, semantics);
}

/// The write barrier by MMTk. The VM calls this to store `target` into the field `slot` of
/// `src`. The store itself is performed here.
///
/// Arguments:
/// * `mutator`: The mutator for the current thread.
/// * `src`: The modified source object.
/// * `slot`: The location of the field to be modified.
/// * `target`: The target for the write operation.
pub fn object_reference_write<VM: VMBinding>(
    mutator: &mut Mutator<VM>,
    src: ObjectReference,
    slot: Address,
    target: ObjectReference,
) {
    mutator.object_reference_write(src, slot, target);
}

/// Trigger a garbage collection as requested by the user, and block until it finishes.
/// The request is ignored when the `ignore_system_gc` option is set, or before
/// [`initialize_collection`].
///
/// Arguments:
/// * `mmtk`: A reference to an MMTk instance.
/// * `tls`: The thread that triggers this collection request.
pub fn handle_user_collection_request<VM: VMBinding>(mmtk: &'static MMTK<VM>, tls: VMMutatorThread) {
    if mmtk.options.ignore_system_gc {
        info!("User collection request ignored");
        return;
    }
    if !mmtk.state.is_collection_enabled() {
        warn!("User collection request before collection is initialized");
        return;
    }
    mmtk.state.request_collection(None, false, true);
    mmtk.collect(tls);
}

/// Poll the collection trigger, and request a collection if the plan wants one. The VM
/// decides when to run it, usually by calling into an allocation slow path.
///
/// Arguments:
/// * `space_full`: a space could not satisfy a request outright.
/// * `space`: the space that ran out, if the VM knows it. A full space other than the nursery
///   makes the next collection a full-heap one.
pub fn collection_required<VM: VMBinding>(
    mmtk: &MMTK<VM>,
    space_full: bool,
    space: Option<&dyn Space<VM>>,
) -> bool {
    mmtk.gc_trigger.poll(space_full, space)
}

/// Return the number of pages in use by all spaces, including pages held in local allocation
/// buffers.
pub fn get_pages_used<VM: VMBinding>(mmtk: &MMTK<VM>) -> usize {
    mmtk.plan.get_pages_used()
}

/// Return the number of pages the mutators may still allocate before a collection, with
/// the collection reserve taken out.
pub fn get_pages_avail<VM: VMBinding>(mmtk: &MMTK<VM>) -> usize {
    mmtk.plan.get_pages_avail()
}

/// Return the size of the heap in pages.
pub fn get_total_pages<VM: VMBinding>(mmtk: &MMTK<VM>) -> usize {
    mmtk.plan.get_total_pages()
}

/// Is the object alive in the current (or last) collection?
///
/// Only meaningful during a collection, after the closure, or after it for objects the last
/// collection did not reclaim. Panics if the object is not in any space of this instance.
pub fn is_live_object<VM: VMBinding>(mmtk: &MMTK<VM>, object: ObjectReference) -> bool {
    mmtk.plan.is_live(object)
}

/// Check if `object` is in one of the spaces of this instance. The check only looks at the
/// address, it does not tell whether an object is allocated there.
pub fn is_in_mmtk_spaces<VM: VMBinding>(mmtk: &MMTK<VM>, object: ObjectReference) -> bool {
    if object.is_null() {
        return false;
    }
    mmtk.plan.space_of(object).is_some()
}

/// Return true if the object will never move: it lives in a non-moving space.
pub fn will_never_move<VM: VMBinding>(mmtk: &MMTK<VM>, object: ObjectReference) -> bool {
    match mmtk.plan.space_of(object) {
        Some(space) => !space.is_movable(),
        None => panic!("{} is not in any space", object),
    }
}

/// The number of collections so far.
pub fn gc_count<VM: VMBinding>(mmtk: &MMTK<VM>) -> usize {
    mmtk.state.gc_count()
}

/// Was the last collection full heap? Always true for non-generational plans once a
/// collection has happened.
pub fn last_gc_was_full_heap<VM: VMBinding>(mmtk: &MMTK<VM>) -> bool {
    mmtk.state.last_gc_was_full_heap()
}

/// A snapshot of the collection counters.
pub fn collection_stats<VM: VMBinding>(mmtk: &MMTK<VM>) -> CollectionStats {
    mmtk.stats.snapshot()
}
