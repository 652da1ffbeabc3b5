use crate::util::Address;
use libc::c_void;

/// A pointer the collector stores and hands back to the VM but never dereferences, such as
/// a thread handle.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OpaquePointer(*mut c_void);

// Never dereferenced by this crate.
unsafe impl Sync for OpaquePointer {}
unsafe impl Send for OpaquePointer {}

impl Default for OpaquePointer {
    fn default() -> Self {
        Self::UNINITIALIZED
    }
}

impl OpaquePointer {
    pub const UNINITIALIZED: Self = Self(std::ptr::null_mut());

    pub fn from_address(addr: Address) -> Self {
        OpaquePointer(addr.to_mut_ptr::<c_void>())
    }

    pub fn to_address(self) -> Address {
        Address::from_mut_ptr(self.0)
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

/// Identifies a VM thread. The binding decides what the pointer means.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VMThread(pub OpaquePointer);

impl VMThread {
    pub const UNINITIALIZED: Self = Self(OpaquePointer::UNINITIALIZED);
}

/// A [`VMThread`] that owns a [`crate::plan::Mutator`].
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VMMutatorThread(pub VMThread);

/// A [`VMThread`] running a [`crate::plan::CollectorContext`].
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VMWorkerThread(pub VMThread);
