//! Mutator context for each application thread.

use crate::plan::barriers::Barrier;
use crate::plan::global::AllocationSemantics;
use crate::plan::phase::Phase;
use crate::policy::space::Space;
use crate::util::alloc::allocator::get_maximum_aligned_size;
use crate::util::alloc::{AllocationError, Allocator, AllocatorSelector, Allocators, SpaceMapping};
use crate::util::opaque_pointer::*;
use crate::util::{Address, ObjectReference};
use crate::vm::{Collection, VMBinding};
use crate::MMTK;
use enum_map::EnumMap;

/// A hook run on a mutator at a collection boundary.
pub type MutatorHook<VM> = &'static (dyn Fn(&mut Mutator<VM>, VMWorkerThread) + Send + Sync);

/// Per-plan configuration of a mutator: which allocator serves which allocation semantics,
/// which space each allocator is bound to, and what the mutator does at collection
/// boundaries.
pub struct MutatorConfig<VM: VMBinding> {
    pub allocator_mapping: EnumMap<AllocationSemantics, AllocatorSelector>,
    pub space_mapping: Box<SpaceMapping<VM>>,
    pub prepare_func: MutatorHook<VM>,
    pub release_func: MutatorHook<VM>,
}

/// The state of one application thread: its thread-local allocators and its write barrier.
pub struct Mutator<VM: VMBinding> {
    pub allocators: Allocators<VM>,
    pub barrier: Box<dyn Barrier<VM>>,
    pub mutator_tls: VMMutatorThread,
    pub mmtk: &'static MMTK<VM>,
    pub config: MutatorConfig<VM>,
}

impl<VM: VMBinding> Mutator<VM> {
    pub fn new(
        tls: VMMutatorThread,
        mmtk: &'static MMTK<VM>,
        barrier: Box<dyn Barrier<VM>>,
        config: MutatorConfig<VM>,
    ) -> Self {
        Mutator {
            allocators: Allocators::new(
                tls.0,
                mmtk.allocator_context.clone(),
                &config.space_mapping,
            ),
            barrier,
            mutator_tls: tls,
            mmtk,
            config,
        }
    }

    /// The allocator for a request. Requests too large for the plan's regular spaces go to
    /// the large object space whatever their semantics.
    fn route(&self, size: usize, align: usize, semantics: AllocationSemantics) -> AllocatorSelector {
        let semantics = if get_maximum_aligned_size::<VM>(size, align)
            > self.mmtk.plan.constraints().max_non_los_default_alloc_bytes
        {
            AllocationSemantics::Los
        } else {
            semantics
        };
        self.config.allocator_mapping[semantics]
    }

    pub fn alloc(
        &mut self,
        size: usize,
        align: usize,
        offset: usize,
        semantics: AllocationSemantics,
    ) -> Address {
        self.alloc_with_site(size, align, offset, semantics, 0)
    }

    /// Allocate `size` bytes so that `result + offset` is aligned to `align`.
    ///
    /// If the space asks for a collection, the collection runs on this thread and the request
    /// is retried, up to `max_collection_attempts` times. After that the VM is told through
    /// [`Collection::out_of_memory`] and zero is returned if that hook returns.
    pub fn alloc_with_site(
        &mut self,
        size: usize,
        align: usize,
        offset: usize,
        semantics: AllocationSemantics,
        site: usize,
    ) -> Address {
        let selector = self.route(size, align, semantics);
        let state = &self.mmtk.state;
        let max_attempts = self.mmtk.options.max_collection_attempts;
        let mut attempts = 0;
        loop {
            let result = self
                .allocators
                .get_allocator_mut(selector)
                .alloc(size, align, offset);
            if !result.is_zero() {
                trace!("alloc({}, {:?}, site {}) = {}", size, semantics, site, result);
                return result;
            }
            if !state.is_collection_requested() {
                // The space already reported the failure to the VM.
                return Address::ZERO;
            }
            if attempts == max_attempts {
                error!(
                    "{} bytes for {:?} still unavailable after {} collections",
                    size, semantics, attempts
                );
                state.cancel_collection_request();
                VM::VMCollection::out_of_memory(self.mutator_tls.0, AllocationError::HeapOutOfMemory);
                return Address::ZERO;
            }
            attempts += 1;
            if attempts > 1 {
                state.set_emergency_collection(true);
            }
            self.mmtk.collect(self.mutator_tls);
        }
    }

    /// Initialize the GC metadata of an object allocated by this mutator. Must run before the
    /// object is reachable from anything other than this thread's stack.
    pub fn post_alloc(&mut self, object: ObjectReference, bytes: usize, _semantics: AllocationSemantics) {
        match self.space_of_allocation(object) {
            Some(space) => space.post_alloc(object, bytes),
            None => panic!("{} was not allocated by this mutator", object),
        }
    }

    fn space_of_allocation(&self, object: ObjectReference) -> Option<&'static dyn Space<VM>> {
        let allocators = &self.allocators;
        allocators
            .bump_pointer
            .iter()
            .map(|a| a.get_space())
            .chain(allocators.free_list.iter().map(|a| a.get_space()))
            .chain(allocators.large_object.iter().map(|a| a.get_space()))
            .find(|space| space.in_space(object))
    }

    /// Store `target` into `slot` of `src` through the write barrier.
    pub fn object_reference_write(&mut self, src: ObjectReference, slot: Address, target: ObjectReference) {
        self.barrier.object_reference_write(src, slot, target);
    }

    /// Hand buffered barrier state to the collector.
    pub fn flush(&mut self) {
        self.barrier.flush();
    }

    pub fn collection_phase(&mut self, tls: VMWorkerThread, phase: Phase) {
        match phase {
            Phase::Prepare => self.prepare(tls),
            Phase::Release => self.release(tls),
            phase => panic!("no mutator {:?} phase", phase),
        }
    }

    pub fn prepare(&mut self, tls: VMWorkerThread) {
        self.flush();
        (self.config.prepare_func)(self, tls)
    }

    pub fn release(&mut self, tls: VMWorkerThread) {
        (self.config.release_func)(self, tls)
    }

    pub fn on_destroy(&mut self) {
        self.allocators.for_each_mut(|a| a.on_mutator_destroy());
        self.flush();
    }

    pub fn get_tls(&self) -> VMMutatorThread {
        self.mutator_tls
    }
}
