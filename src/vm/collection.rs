use crate::util::alloc::AllocationError;
use crate::util::opaque_pointer::*;
use crate::vm::VMBinding;

/// Thread control and fatal-error hooks of the VM.
pub trait Collection<VM: VMBinding> {
    /// Stop every mutator at a safe point. Returns once all of them are stopped. The thread
    /// requesting the collection is already at a safe point.
    fn stop_all_mutators(tls: VMWorkerThread);

    /// Resume the mutators stopped by [`Collection::stop_all_mutators`].
    fn resume_mutators(tls: VMWorkerThread);

    /// The heap cannot satisfy an allocation even after collecting.
    ///
    /// The default implementation panics. A binding that overrides it and returns gets a zero
    /// address from the failed allocation.
    fn out_of_memory(_tls: VMThread, err_kind: AllocationError) {
        panic!("Out of memory with {:?}!", err_kind);
    }
}
