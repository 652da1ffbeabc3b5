//! Thread-local allocators.

pub mod allocator;
pub mod allocators;
mod bumpallocator;
mod free_list_allocator;
mod large_object_allocator;

pub use self::allocator::{AllocationError, Allocator, AllocatorContext};
pub use self::allocators::{AllocatorSelector, Allocators, SpaceMapping};
pub use self::bumpallocator::BumpAllocator;
pub use self::free_list_allocator::FreeListAllocator;
pub use self::large_object_allocator::LargeObjectAllocator;
