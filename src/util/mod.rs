//! Utilities shared by plans and policies.

/// Address and object reference types.
pub mod address;
/// Thread-local allocators.
pub mod alloc;
pub mod constants;
pub mod conversions;
/// The GC byte in the header of every object.
pub mod header_byte;
/// Heap layout, page resources and the collection trigger.
pub mod heap;
pub mod logger;
/// Thin wrappers over mmap.
pub mod memory;
pub mod metadata;
pub mod object_forwarding;
pub mod opaque_pointer;
pub mod options;
/// Work queues of the transitive closure.
pub mod queue;
pub mod statistics;
pub mod treadmill;

#[cfg(any(test, feature = "mock_test"))]
pub mod test_util;

pub use self::address::Address;
pub use self::address::ObjectReference;
pub use self::opaque_pointer::*;
