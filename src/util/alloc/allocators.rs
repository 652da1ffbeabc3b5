use super::allocator::{Allocator, AllocatorContext};
use super::{BumpAllocator, FreeListAllocator, LargeObjectAllocator};
use crate::policy::largeobjectspace::LargeObjectSpace;
use crate::policy::marksweepspace::MarkSweepSpace;
use crate::policy::space::Space;
use crate::util::opaque_pointer::*;
use crate::vm::VMBinding;
use std::sync::Arc;

/// Names one allocator of an [`Allocators`] set: the kind plus the index among allocators of
/// that kind.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AllocatorSelector {
    BumpPointer(u8),
    FreeList(u8),
    LargeObject(u8),
    #[default]
    None,
}

/// Which allocator is bound to which space.
pub type SpaceMapping<VM> = Vec<(AllocatorSelector, &'static dyn Space<VM>)>;

/// The allocators owned by one mutator.
pub struct Allocators<VM: VMBinding> {
    pub bump_pointer: Vec<BumpAllocator<VM>>,
    pub free_list: Vec<FreeListAllocator<VM>>,
    pub large_object: Vec<LargeObjectAllocator<VM>>,
}

impl<VM: VMBinding> Allocators<VM> {
    /// Build one allocator per entry of `space_mapping`. Indices of each kind must be
    /// consecutive from zero.
    pub fn new(
        tls: VMThread,
        context: Arc<AllocatorContext>,
        space_mapping: &[(AllocatorSelector, &'static dyn Space<VM>)],
    ) -> Self {
        let mut allocators = Allocators {
            bump_pointer: vec![],
            free_list: vec![],
            large_object: vec![],
        };
        for &(selector, space) in space_mapping {
            match selector {
                AllocatorSelector::BumpPointer(index) => {
                    assert_eq!(index as usize, allocators.bump_pointer.len());
                    allocators
                        .bump_pointer
                        .push(BumpAllocator::new(tls, space, context.clone()));
                }
                AllocatorSelector::FreeList(index) => {
                    assert_eq!(index as usize, allocators.free_list.len());
                    let space = match space.downcast_ref::<MarkSweepSpace<VM>>() {
                        Some(space) => space,
                        None => panic!("{} is not a mark-sweep space", space.name()),
                    };
                    allocators
                        .free_list
                        .push(FreeListAllocator::new(tls, space, context.clone()));
                }
                AllocatorSelector::LargeObject(index) => {
                    assert_eq!(index as usize, allocators.large_object.len());
                    let space = match space.downcast_ref::<LargeObjectSpace<VM>>() {
                        Some(space) => space,
                        None => panic!("{} is not a large object space", space.name()),
                    };
                    allocators
                        .large_object
                        .push(LargeObjectAllocator::new(tls, space, context.clone()));
                }
                AllocatorSelector::None => panic!("no allocator to bind to {}", space.name()),
            }
        }
        allocators
    }

    pub fn get_allocator(&self, selector: AllocatorSelector) -> &dyn Allocator<VM> {
        match selector {
            AllocatorSelector::BumpPointer(i) => &self.bump_pointer[i as usize],
            AllocatorSelector::FreeList(i) => &self.free_list[i as usize],
            AllocatorSelector::LargeObject(i) => &self.large_object[i as usize],
            AllocatorSelector::None => panic!("allocation with AllocatorSelector::None"),
        }
    }

    pub fn get_allocator_mut(&mut self, selector: AllocatorSelector) -> &mut dyn Allocator<VM> {
        match selector {
            AllocatorSelector::BumpPointer(i) => &mut self.bump_pointer[i as usize],
            AllocatorSelector::FreeList(i) => &mut self.free_list[i as usize],
            AllocatorSelector::LargeObject(i) => &mut self.large_object[i as usize],
            AllocatorSelector::None => panic!("allocation with AllocatorSelector::None"),
        }
    }

    /// The allocator behind `selector` as its concrete type.
    pub fn get_typed_allocator_mut<T: Allocator<VM>>(&mut self, selector: AllocatorSelector) -> &mut T {
        match self.get_allocator_mut(selector).downcast_mut::<T>() {
            Some(allocator) => allocator,
            None => panic!("{:?} is not a {}", selector, std::any::type_name::<T>()),
        }
    }

    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut dyn Allocator<VM>)) {
        self.bump_pointer.iter_mut().for_each(|a| f(a));
        self.free_list.iter_mut().for_each(|a| f(a));
        self.large_object.iter_mut().for_each(|a| f(a));
    }
}
