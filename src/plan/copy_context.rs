use crate::plan::PlanConstraints;
use crate::policy::largeobjectspace::LargeObjectSpace;
use crate::policy::marksweepspace::MarkSweepSpace;
use crate::policy::space::Space;
use crate::util::alloc::allocator::get_maximum_aligned_size;
use crate::util::alloc::{
    Allocator, AllocatorContext, BumpAllocator, FreeListAllocator, LargeObjectAllocator,
};
use crate::util::opaque_pointer::*;
use crate::util::{Address, ObjectReference};
use crate::vm::VMBinding;
use enum_map::{Enum, EnumMap};
use std::sync::Arc;

/// What a copy is for. Plans map each semantics to a copy allocator.
#[derive(Clone, Copy, Debug, Enum, PartialEq, Eq)]
pub enum CopySemantics {
    /// The default destination of a surviving object.
    DefaultCopy,
    /// Promote a nursery object into the mature space.
    Mature,
    /// Copy a large object. Chosen automatically for copies above
    /// `PlanConstraints::max_non_los_copy_bytes`.
    Los,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CopySelector {
    CopySpace(u8),
    MarkSweepSpace(u8),
    LargeObjectSpace(u8),
    #[default]
    Unused,
}

/// Which copy allocator serves which copy semantics, and which space each allocator is bound
/// to. Each copying plan provides one.
pub struct CopyConfig<VM: VMBinding> {
    pub copy_mapping: EnumMap<CopySemantics, CopySelector>,
    pub space_mapping: Vec<(CopySelector, &'static dyn Space<VM>)>,
    pub constraints: &'static PlanConstraints,
}

/// The copy allocators of one collector thread.
pub struct CopyContext<VM: VMBinding> {
    bump: Vec<BumpAllocator<VM>>,
    free_list: Vec<FreeListAllocator<VM>>,
    los: Vec<LargeObjectAllocator<VM>>,
    config: CopyConfig<VM>,
}

impl<VM: VMBinding> CopyContext<VM> {
    pub fn new(tls: VMWorkerThread, context: Arc<AllocatorContext>, config: CopyConfig<VM>) -> Self {
        let mut ctx = CopyContext {
            bump: vec![],
            free_list: vec![],
            los: vec![],
            config,
        };
        for &(selector, space) in ctx.config.space_mapping.iter() {
            match selector {
                CopySelector::CopySpace(index) => {
                    debug_assert_eq!(index as usize, ctx.bump.len());
                    ctx.bump
                        .push(BumpAllocator::new(tls.0, space, context.clone()));
                }
                CopySelector::MarkSweepSpace(index) => {
                    debug_assert_eq!(index as usize, ctx.free_list.len());
                    let space = match space.downcast_ref::<MarkSweepSpace<VM>>() {
                        Some(space) => space,
                        None => panic!("{} is not a mark-sweep space", space.name()),
                    };
                    ctx.free_list
                        .push(FreeListAllocator::new(tls.0, space, context.clone()));
                }
                CopySelector::LargeObjectSpace(index) => {
                    debug_assert_eq!(index as usize, ctx.los.len());
                    let space = match space.downcast_ref::<LargeObjectSpace<VM>>() {
                        Some(space) => space,
                        None => panic!("{} is not a large object space", space.name()),
                    };
                    ctx.los
                        .push(LargeObjectAllocator::new(tls.0, space, context.clone()));
                }
                CopySelector::Unused => unreachable!(),
            }
        }
        ctx
    }

    fn allocator(&mut self, selector: CopySelector) -> &mut dyn Allocator<VM> {
        match selector {
            CopySelector::CopySpace(index) => &mut self.bump[index as usize],
            CopySelector::MarkSweepSpace(index) => &mut self.free_list[index as usize],
            CopySelector::LargeObjectSpace(index) => &mut self.los[index as usize],
            CopySelector::Unused => unreachable!("no copy allocator selected"),
        }
    }

    /// Get memory for a copy of `original`.
    ///
    /// Panics if the destination is full. The collection reserve of the plan guarantees room
    /// for every survivor, so a failure here means the heap is corrupt.
    pub fn alloc_copy(
        &mut self,
        original: ObjectReference,
        bytes: usize,
        align: usize,
        offset: usize,
        semantics: CopySemantics,
    ) -> Address {
        let semantics = if get_maximum_aligned_size::<VM>(bytes, align)
            > self.config.constraints.max_non_los_copy_bytes
        {
            CopySemantics::Los
        } else {
            semantics
        };
        let selector = self.config.copy_mapping[semantics];
        let allocator = self.allocator(selector);
        let result = allocator.alloc(bytes, align, offset);
        if result.is_zero() {
            panic!(
                "{}: no room to copy {} ({} bytes, {:?})",
                allocator.get_space().name(),
                original,
                bytes,
                semantics
            );
        }
        result
    }

    /// Initialize the metadata of a new copy. Dispatches on the space the copy landed in.
    pub fn post_copy(&mut self, object: ObjectReference, bytes: usize, _semantics: CopySemantics) {
        match self
            .config
            .space_mapping
            .iter()
            .find(|(_, space)| space.in_space(object))
        {
            Some((_, space)) => space.post_copy(object, bytes),
            None => panic!("copy {} is not in any copy destination", object),
        }
    }

    /// Point the bump allocator `index` at another space.
    pub fn rebind(&mut self, index: usize, space: &'static dyn Space<VM>) {
        self.bump[index].rebind(space);
        for (selector, mapped) in self.config.space_mapping.iter_mut() {
            if *selector == CopySelector::CopySpace(index as u8) {
                *mapped = space;
            }
        }
    }

    /// Drop the local buffers of every copy allocator.
    pub fn reset(&mut self) {
        self.bump.iter_mut().for_each(|a| a.reset());
        self.free_list.iter_mut().for_each(|a| a.reset());
        self.los.iter_mut().for_each(|a| a.reset());
    }

    pub fn reset_free_lists(&mut self) {
        self.free_list.iter_mut().for_each(|a| a.reset());
    }
}

